use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::notification_dto::{
        MarkAllReadResponse, NotificationListQuery, NotificationPollQuery, UnreadCountResponse,
    },
    error::Result,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("unread_only" = Option<bool>, Query, description = "Skip notifications already read"),
        ("limit" = Option<i64>, Query, description = "Maximum items, default 50")
    ),
    responses((status = 200, description = "Notifications, newest first"))
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse> {
    let items = state
        .notification_service
        .list(query.unread_only.unwrap_or(false), query.limit)
        .await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/notifications/poll",
    params(("since" = Option<String>, Query, description = "RFC 3339 timestamp of the last poll")),
    responses((status = 200, description = "Notifications created after `since`"))
)]
#[axum::debug_handler]
pub async fn poll_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationPollQuery>,
) -> Result<impl IntoResponse> {
    let items = state.notification_service.poll(query.since).await?;
    Ok(Json(items))
}

#[axum::debug_handler]
pub async fn unread_count(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let unread = state.notification_service.unread_count().await?;
    Ok(Json(UnreadCountResponse { unread }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Marked as read"),
        (status = 404, description = "Notification not found")
    )
)]
#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.notification_service.mark_read(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn mark_all_read(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let updated = state.notification_service.mark_all_read().await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
