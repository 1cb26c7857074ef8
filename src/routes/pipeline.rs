use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::pipeline_dto::MoveStagePayload,
    error::Result,
    services::pipeline_service::{BoardColumn, TransitionOutcome},
    utils::token::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/candidates/{id}/stage",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    request_body = MoveStagePayload,
    responses(
        (status = 200, description = "Outcome of the move", body = Json<TransitionOutcome>),
        (status = 400, description = "Unknown stage, score out of range or missing rejection reason"),
        (status = 404, description = "Candidate not found"),
        (status = 409, description = "Candidate already left the pipeline")
    )
)]
#[axum::debug_handler]
pub async fn move_stage(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveStagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .pipeline_service
        .move_to_stage(id, payload, Some(claims.sub))
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/candidates/{id}/stages",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    responses(
        (status = 200, description = "Stage log, newest first"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn stage_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let records = state.pipeline_service.stage_history(id).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/pipeline/board",
    responses(
        (status = 200, description = "One column per stage", body = Json<Vec<BoardColumn>>)
    )
)]
#[axum::debug_handler]
pub async fn board(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let columns = state.pipeline_service.board().await?;
    Ok(Json(columns))
}
