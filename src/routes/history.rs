use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::history_dto::HistoryListQuery,
    error::{Error, Result},
    models::history::{FinalStatus, HistoryFilter},
    AppState,
};

pub(crate) fn history_filter(query: HistoryListQuery) -> Result<HistoryFilter> {
    let final_status = match query.final_status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<FinalStatus>().map_err(Error::BadRequest)?),
        None => None,
    };
    Ok(HistoryFilter {
        final_status,
        search: query.search.filter(|s| !s.trim().is_empty()),
    })
}

#[utoipa::path(
    get,
    path = "/api/history",
    params(
        ("final_status" = Option<String>, Query, description = "rejected | talent_pool | withdrawn | approved"),
        ("search" = Option<String>, Query, description = "Partial name")
    ),
    responses((status = 200, description = "Archived applications, newest first"))
)]
#[axum::debug_handler]
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryListQuery>,
) -> Result<impl IntoResponse> {
    let records = state.history_service.list(history_filter(query)?).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/history/{id}",
    params(("id" = Uuid, Path, description = "History record ID")),
    responses(
        (status = 200, description = "History record"),
        (status = 404, description = "Record not found")
    )
)]
#[axum::debug_handler]
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let record = state.history_service.get(id).await?;
    Ok(Json(record))
}

#[utoipa::path(
    get,
    path = "/api/history/{id}/stages",
    params(("id" = Uuid, Path, description = "History record ID")),
    responses(
        (status = 200, description = "Stage log kept from the archived application, newest first"),
        (status = 404, description = "Record not found")
    )
)]
#[axum::debug_handler]
pub async fn history_stages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let records = state.history_service.stage_log(id).await?;
    Ok(Json(records))
}
