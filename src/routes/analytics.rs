use axum::{
    extract::State,
    response::{IntoResponse, Json},
};

use crate::{error::Result, services::analytics_service::DashboardStats, AppState};

#[utoipa::path(
    get,
    path = "/api/analytics/dashboard",
    responses(
        (status = 200, description = "Dashboard figures", body = Json<DashboardStats>)
    )
)]
#[axum::debug_handler]
pub async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.analytics_service.dashboard().await?;
    Ok(Json(stats))
}
