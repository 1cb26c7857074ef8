use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::notification::{NewNotification, Notification};
use crate::services::change_feed::{ChangeAction, ChangeFeed};
use crate::store::SharedStore;

pub const KIND_STAGE_CHANGED: &str = "stage_changed";
pub const KIND_CANDIDATE_REJECTED: &str = "candidate_rejected";
pub const KIND_CANDIDATE_HIRED: &str = "candidate_hired";
pub const KIND_NEW_APPLICATION: &str = "new_application";
pub const KIND_POSSIBLE_DUPLICATE: &str = "possible_duplicate";
pub const KIND_PROPOSAL_RESPONSE: &str = "proposal_response";

const DEFAULT_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct NotificationService {
    store: SharedStore,
    feed: ChangeFeed,
}

impl NotificationService {
    pub fn new(store: SharedStore, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }

    /// Best effort: a failed notification never fails the operation that
    /// raised it.
    pub async fn notify(
        &self,
        kind: &str,
        title: impl Into<String>,
        message: impl Into<String>,
        candidate_id: Option<Uuid>,
    ) -> Option<Notification> {
        let draft = NewNotification {
            kind: kind.to_string(),
            title: title.into(),
            message: message.into(),
            candidate_id,
        };
        match self.store.insert_notification(draft).await {
            Ok(n) => {
                self.feed.publish("notifications", ChangeAction::Insert, n.id);
                Some(n)
            }
            Err(e) => {
                tracing::warn!(error = %e, kind, "failed to record notification");
                None
            }
        }
    }

    pub async fn list(&self, unread_only: bool, limit: Option<i64>) -> Result<Vec<Notification>> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 200);
        self.store.list_notifications(unread_only, None, limit).await
    }

    pub async fn poll(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Notification>> {
        self.store
            .list_notifications(false, since, DEFAULT_LIMIT)
            .await
    }

    pub async fn unread_count(&self) -> Result<i64> {
        self.store.count_unread_notifications().await
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<()> {
        if !self.store.mark_notification_read(id).await? {
            return Err(Error::NotFound("Notification not found".to_string()));
        }
        self.feed.publish("notifications", ChangeAction::Update, id);
        Ok(())
    }

    pub async fn mark_all_read(&self) -> Result<u64> {
        self.store.mark_all_notifications_read().await
    }
}
