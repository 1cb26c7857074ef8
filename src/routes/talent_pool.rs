use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        candidate_dto::CandidateListResponse,
        talent_pool_dto::{
            ArchiveCandidatePayload, FlagTalentPayload, ProposalResponsePayload, TalentPoolQuery,
        },
    },
    error::Result,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/talent-pool",
    params(("sector" = Option<String>, Query, description = "Sector of interest")),
    responses(
        (status = 200, description = "Talent pool members", body = Json<CandidateListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_talent_pool(
    State(state): State<AppState>,
    Query(query): Query<TalentPoolQuery>,
) -> Result<impl IntoResponse> {
    let items = state.talent_pool_service.list(query.sector).await?;
    Ok(Json(CandidateListResponse::from(items)))
}

#[utoipa::path(
    post,
    path = "/api/candidates/{id}/talent-pool",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    request_body = FlagTalentPayload,
    responses(
        (status = 200, description = "Candidate added to the pool"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn flag_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FlagTalentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let candidate = state.talent_pool_service.flag(id, payload).await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    delete,
    path = "/api/candidates/{id}/talent-pool",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    responses(
        (status = 200, description = "Candidate removed from the pool"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn unflag_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let candidate = state.talent_pool_service.unflag(id).await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    post,
    path = "/api/candidates/{id}/proposal-response",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    request_body = ProposalResponsePayload,
    responses(
        (status = 200, description = "Accepted proposals are archived as approved"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn respond_to_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProposalResponsePayload>,
) -> Result<impl IntoResponse> {
    let outcome = state
        .talent_pool_service
        .respond_to_proposal(id, payload.accepted)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/candidates/{id}/archive",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    request_body = ArchiveCandidatePayload,
    responses(
        (status = 200, description = "Application moved to history"),
        (status = 400, description = "Final status must be withdrawn or talent_pool"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn archive_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ArchiveCandidatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let history = state.talent_pool_service.archive(id, payload).await?;
    Ok(Json(history))
}
