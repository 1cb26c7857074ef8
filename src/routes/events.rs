use axum::{
    extract::{Query, State},
    response::sse::{KeepAlive, Sse},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventsQuery {
    pub table: Option<String>,
}

/// Server-sent row changes. Clients refetch what they display when an
/// event arrives.
#[axum::debug_handler]
pub async fn stream_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> impl IntoResponse {
    let table = query.table.filter(|t| !t.trim().is_empty());
    tracing::debug!(
        ?table,
        subscribers = state.feed.subscriber_count(),
        "change feed subscriber connected"
    );
    Sse::new(state.feed.event_stream(table)).keep_alive(KeepAlive::default())
}
