use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    dto::history_dto::HistoryListQuery,
    error::Result,
    routes::history::history_filter,
    services::export_service::XLSX_CONTENT_TYPE,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BulkExportRequest {
    pub candidate_ids: Option<Vec<Uuid>>,
}

fn xlsx_response(prefix: &str, buffer: Vec<u8>) -> impl IntoResponse {
    let filename = format!("{}_{}.xlsx", prefix, Utc::now().format("%Y%m%d"));
    let disposition = format!("attachment; filename=\"{}\"", filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    )
}

/// Export the selected candidates, or every active one, as XLSX
#[utoipa::path(
    post,
    path = "/api/export/candidates",
    responses((status = 200, description = "XLSX workbook"))
)]
#[axum::debug_handler]
pub async fn export_candidates(
    State(state): State<AppState>,
    Json(payload): Json<BulkExportRequest>,
) -> Result<impl IntoResponse> {
    let buffer = state.export_service.candidates(payload.candidate_ids).await?;
    Ok(xlsx_response("candidatos", buffer))
}

/// Export archived applications as XLSX
#[utoipa::path(
    get,
    path = "/api/export/history",
    params(
        ("final_status" = Option<String>, Query, description = "rejected | talent_pool | withdrawn | approved"),
        ("search" = Option<String>, Query, description = "Partial name")
    ),
    responses((status = 200, description = "XLSX workbook"))
)]
#[axum::debug_handler]
pub async fn export_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryListQuery>,
) -> Result<impl IntoResponse> {
    let buffer = state.export_service.history(history_filter(query)?).await?;
    Ok(xlsx_response("historico", buffer))
}
