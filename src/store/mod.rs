//! Persistence seam for the recruitment data.
//!
//! Services only talk to [`RecruitmentStore`]. `PgStore` backs production,
//! `MemoryStore` backs local runs and the test suite.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    candidate::{Candidate, CandidateChanges, CandidateFilter, NewCandidate},
    history::{HistoryFilter, HistoryLookup, HistoryRecord, NewHistoryRecord},
    job::{Job, JobChanges, JobFilter, NewJob},
    notification::{NewNotification, Notification},
    stage::{NewStageRecord, StageRecord},
    user::{NewUser, Theme, User},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type SharedStore = Arc<dyn RecruitmentStore>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecruitmentStore: Send + Sync {
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate>;
    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>>;
    async fn find_candidate_by_tax_id(&self, tax_id: &str) -> Result<Option<Candidate>>;
    /// Newest first.
    async fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>>;
    async fn update_candidate(
        &self,
        id: Uuid,
        changes: &CandidateChanges,
    ) -> Result<Option<Candidate>>;
    async fn delete_candidate(&self, id: Uuid) -> Result<bool>;

    async fn append_stage_record(&self, record: NewStageRecord) -> Result<StageRecord>;
    /// Oldest first.
    async fn stage_records(&self, candidate_id: Uuid) -> Result<Vec<StageRecord>>;
    async fn stage_records_for(&self, candidate_ids: &[Uuid]) -> Result<Vec<StageRecord>>;

    /// Inserts the history row, points the candidate's stage log at it and
    /// deletes the active candidate as one unit. Fails with `NotFound` when
    /// the candidate is already gone.
    async fn archive_candidate(
        &self,
        candidate_id: Uuid,
        record: NewHistoryRecord,
    ) -> Result<HistoryRecord>;
    /// `append_stage_record` followed by `archive_candidate`, all or nothing.
    async fn reject_candidate(
        &self,
        stage: NewStageRecord,
        record: NewHistoryRecord,
    ) -> Result<(StageRecord, HistoryRecord)>;
    /// Stage log of an archived application, oldest first.
    async fn history_stage_records(&self, history_id: Uuid) -> Result<Vec<StageRecord>>;
    /// Most recent application first.
    async fn lookup_history(&self, lookup: &HistoryLookup) -> Result<Vec<HistoryRecord>>;
    async fn list_history(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>>;
    async fn get_history(&self, id: Uuid) -> Result<Option<HistoryRecord>>;

    async fn insert_job(&self, job: NewJob) -> Result<Job>;
    async fn get_job(&self, id: Uuid) -> Result<Option<Job>>;
    /// Returns the requested page and the total count.
    async fn list_jobs(&self, filter: &JobFilter, limit: i64, offset: i64)
        -> Result<(Vec<Job>, i64)>;
    async fn update_job(&self, id: Uuid, changes: &JobChanges) -> Result<Option<Job>>;
    async fn delete_job(&self, id: Uuid) -> Result<bool>;

    async fn insert_user(&self, user: NewUser) -> Result<User>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn set_user_theme(&self, id: Uuid, theme: Theme) -> Result<Option<User>>;

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification>;
    /// Newest first.
    async fn list_notifications(
        &self,
        unread_only: bool,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Notification>>;
    async fn count_unread_notifications(&self) -> Result<i64>;
    async fn mark_notification_read(&self, id: Uuid) -> Result<bool>;
    async fn mark_all_notifications_read(&self) -> Result<u64>;
}
