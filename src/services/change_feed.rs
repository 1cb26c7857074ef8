use axum::response::sse::Event;
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub action: ChangeAction,
    pub id: Uuid,
    pub at: DateTime<Utc>,
}

/// Push-based row change notifications. Slow subscribers skip what they
/// missed and keep going; clients refetch to catch up.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, table: &str, action: ChangeAction, id: Uuid) {
        let event = ChangeEvent {
            table: table.to_string(),
            action,
            id,
            at: Utc::now(),
        };
        match self.tx.send(event) {
            Ok(n) => tracing::debug!(table, ?action, %id, subscribers = n, "change published"),
            Err(_) => tracing::trace!(table, ?action, %id, "change published with no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// SSE stream, optionally limited to one table.
    pub fn event_stream(
        &self,
        table: Option<String>,
    ) -> impl Stream<Item = Result<Event, Infallible>> {
        BroadcastStream::new(self.subscribe()).filter_map(move |result| {
            let table = table.clone();
            async move {
                match result {
                    Ok(change) => {
                        if table.as_deref().map(|t| t != change.table).unwrap_or(false) {
                            return None;
                        }
                        Event::default()
                            .event(change.table.clone())
                            .json_data(&change)
                            .ok()
                            .map(Ok)
                    }
                    Err(e) => {
                        tracing::warn!("change feed subscriber lagged: {:?}", e);
                        None
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_changes() {
        let feed = ChangeFeed::new(8);
        let mut rx = feed.subscribe();
        let id = Uuid::new_v4();
        feed.publish("candidates", ChangeAction::Update, id);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.table, "candidates");
        assert_eq!(event.action, ChangeAction::Update);
        assert_eq!(event.id, id);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let feed = ChangeFeed::new(8);
        feed.publish("jobs", ChangeAction::Insert, Uuid::new_v4());
        assert_eq!(feed.subscriber_count(), 0);
    }
}
