use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, LoginResponse, PreferencesPayload, PreferencesResponse},
    error::Result,
    utils::token::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Session started", body = Json<LoginResponse>),
        (status = 401, description = "Invalid email or password")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let session = state.auth_service.login(payload).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    state.auth_service.logout(&claims).await;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.me(claims.sub).await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/me/preferences",
    responses(
        (status = 200, description = "Stored preferences", body = Json<PreferencesResponse>)
    )
)]
#[axum::debug_handler]
pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let theme = state.auth_service.theme(claims.sub).await?;
    Ok(Json(PreferencesResponse { theme }))
}

#[utoipa::path(
    put,
    path = "/api/me/preferences",
    request_body = PreferencesPayload,
    responses(
        (status = 200, description = "Preferences saved", body = Json<PreferencesResponse>)
    )
)]
#[axum::debug_handler]
pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PreferencesPayload>,
) -> Result<impl IntoResponse> {
    let theme = state.auth_service.set_theme(claims.sub, &payload.theme).await?;
    Ok(Json(PreferencesResponse { theme }))
}
