use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::public_dto::ApplicationForm,
    error::{Error, Result},
    models::candidate::Candidate,
    routes::candidate_routes::read_multipart,
    AppState,
};

/// Public application form. Multipart with text fields plus an optional
/// `resume` file.
#[utoipa::path(
    post,
    path = "/api/public/applications",
    responses(
        (status = 201, description = "Application received", body = Json<Candidate>),
        (status = 400, description = "Invalid form, CPF or résumé"),
        (status = 409, description = "CPF already has an active application"),
        (status = 413, description = "Résumé too large")
    )
)]
#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut form = ApplicationForm::default();
    let resume = read_multipart(&mut multipart, |name, value| {
        form.set_field(name, value).map_err(Error::BadRequest)
    })
    .await?;
    form.validate()?;

    let candidate = state
        .candidate_service
        .submit_application(form, resume)
        .await?;
    tracing::info!(candidate_id = %candidate.id, "public application received");
    Ok((StatusCode::CREATED, Json(candidate)))
}
