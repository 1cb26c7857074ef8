use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::candidate_dto::{
        CandidateListQuery, CandidateListResponse, CreateCandidatePayload, DuplicateCheckQuery,
        UpdateCandidatePayload,
    },
    error::{Error, Result},
    models::candidate::{Candidate, CandidateFilter, CandidateStatus},
    services::{history_service::DuplicateReport, resume_service::ResumeUpload},
    AppState,
};

const RESUME_FIELDS: [&str; 3] = ["resume", "cv", "file"];

/// Reads the first résumé file part of a multipart body. Text parts are
/// handed to `on_text`.
pub(crate) async fn read_multipart<F>(
    multipart: &mut Multipart,
    mut on_text: F,
) -> Result<Option<ResumeUpload>>
where
    F: FnMut(&str, String) -> Result<()>,
{
    let mut resume = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if RESUME_FIELDS.contains(&name.as_str()) && field.file_name().is_some() {
            let file_name = field.file_name().unwrap_or("resume").to_string();
            let data = field.bytes().await?;
            if resume.is_none() && !data.is_empty() {
                resume = Some(ResumeUpload { file_name, data });
            }
        } else {
            let value = field.text().await?;
            on_text(&name, value)?;
        }
    }
    Ok(resume)
}

#[utoipa::path(
    post,
    path = "/api/candidates",
    request_body = CreateCandidatePayload,
    responses(
        (status = 201, description = "Candidate created", body = Json<Candidate>),
        (status = 400, description = "Invalid payload or CPF"),
        (status = 409, description = "Previous applications on record or CPF already active")
    )
)]
#[axum::debug_handler]
pub async fn create_candidate(
    State(state): State<AppState>,
    Json(payload): Json<CreateCandidatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let candidate = state.candidate_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

#[utoipa::path(
    get,
    path = "/api/candidates",
    params(
        ("status" = Option<String>, Query, description = "new | in_process | hired | dismissed"),
        ("talent_pool" = Option<bool>, Query, description = "Only talent pool members"),
        ("sector" = Option<String>, Query, description = "Sector of interest"),
        ("search" = Option<String>, Query, description = "Name, email or role")
    ),
    responses(
        (status = 200, description = "Active candidates", body = Json<CandidateListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_candidates(
    State(state): State<AppState>,
    Query(query): Query<CandidateListQuery>,
) -> Result<impl IntoResponse> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<CandidateStatus>().map_err(Error::BadRequest)?),
        None => None,
    };
    let filter = CandidateFilter {
        status,
        talent_pool: query.talent_pool,
        sector: query.sector.filter(|s| !s.trim().is_empty()),
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let items = state.candidate_service.list(filter).await?;
    Ok(Json(CandidateListResponse::from(items)))
}

#[utoipa::path(
    get,
    path = "/api/candidates/duplicates",
    params(
        ("name" = Option<String>, Query, description = "Partial name"),
        ("phone" = Option<String>, Query, description = "Phone, 9 digits or more"),
        ("tax_id" = Option<String>, Query, description = "CPF, masked or bare")
    ),
    responses(
        (status = 200, description = "Previous applications and flags", body = Json<DuplicateReport>)
    )
)]
#[axum::debug_handler]
pub async fn check_duplicates(
    State(state): State<AppState>,
    Query(query): Query<DuplicateCheckQuery>,
) -> Result<impl IntoResponse> {
    let report = state
        .candidate_service
        .check_duplicates(
            query.name.as_deref(),
            query.phone.as_deref(),
            query.tax_id.as_deref(),
        )
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/candidates/{id}",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    responses(
        (status = 200, description = "Candidate found", body = Json<Candidate>),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let candidate = state.candidate_service.get(id).await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    patch,
    path = "/api/candidates/{id}",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    request_body = UpdateCandidatePayload,
    responses(
        (status = 200, description = "Candidate updated", body = Json<Candidate>),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn update_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCandidatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let candidate = state.candidate_service.update(id, payload).await?;
    Ok(Json(candidate))
}

#[utoipa::path(
    delete,
    path = "/api/candidates/{id}",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    responses(
        (status = 204, description = "Candidate deleted"),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.candidate_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/candidates/{id}/resume",
    params(("id" = Uuid, Path, description = "Candidate ID")),
    responses(
        (status = 200, description = "Résumé stored", body = Json<Candidate>),
        (status = 400, description = "Missing file or unsupported type"),
        (status = 413, description = "File larger than 5 MB")
    )
)]
#[axum::debug_handler]
pub async fn upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let upload = read_multipart(&mut multipart, |_, _| Ok(()))
        .await?
        .ok_or_else(|| Error::BadRequest("A résumé file is required".to_string()))?;
    let candidate = state.candidate_service.attach_resume(id, upload).await?;
    Ok(Json(candidate))
}
