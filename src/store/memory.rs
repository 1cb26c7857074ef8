use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::RecruitmentStore;
use crate::error::{Error, Result};
use crate::models::{
    candidate::{Candidate, CandidateChanges, CandidateFilter, CandidateStatus, NewCandidate},
    history::{HistoryFilter, HistoryLookup, HistoryRecord, NewHistoryRecord},
    job::{Job, JobChanges, JobFilter, NewJob},
    notification::{NewNotification, Notification},
    stage::{NewStageRecord, StageRecord, STAGE_STATUS_IN_PROGRESS},
    user::{NewUser, Theme, User},
};
use crate::utils::{cpf::digits_only, text::contains_ignore_case, time::now};

#[derive(Default)]
struct Tables {
    candidates: Vec<Candidate>,
    stage_records: Vec<StageRecord>,
    history: Vec<HistoryRecord>,
    jobs: Vec<Job>,
    users: Vec<User>,
    notifications: Vec<Notification>,
}

/// Process-local store. Every method takes the lock once, so each call is
/// atomic with respect to the others.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn has_candidate(&self, id: Uuid) -> bool {
        self.candidates.iter().any(|c| c.id == id)
    }

    fn append_stage_record(&mut self, record: NewStageRecord) -> Result<StageRecord> {
        if !self.has_candidate(record.candidate_id) {
            return Err(Error::NotFound("Candidate not found".to_string()));
        }
        let row = StageRecord {
            id: Uuid::new_v4(),
            candidate_id: record.candidate_id,
            history_id: None,
            stage: record.stage,
            status: STAGE_STATUS_IN_PROGRESS.to_string(),
            score: record.score,
            notes: record.notes,
            rejection_reason: record.rejection_reason,
            created_by: record.created_by,
            created_at: now(),
        };
        self.stage_records.push(row.clone());
        Ok(row)
    }

    fn archive_candidate(
        &mut self,
        candidate_id: Uuid,
        record: NewHistoryRecord,
    ) -> Result<HistoryRecord> {
        if !self.has_candidate(candidate_id) {
            return Err(Error::NotFound("Candidate not found".to_string()));
        }
        let row = HistoryRecord {
            id: Uuid::new_v4(),
            full_name: record.full_name,
            phone: record.phone,
            tax_id: record.tax_id,
            email: record.email,
            desired_role: record.desired_role,
            job_id: record.job_id,
            final_status: record.final_status,
            final_stage: record.final_stage,
            score: record.score,
            notes: record.notes,
            application_date: record.application_date,
        };
        self.history.push(row.clone());
        self.candidates.retain(|c| c.id != candidate_id);
        for log in self
            .stage_records
            .iter_mut()
            .filter(|r| r.candidate_id == candidate_id && r.history_id.is_none())
        {
            log.history_id = Some(row.id);
        }
        Ok(row)
    }
}

fn newest_first<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
}

#[async_trait]
impl RecruitmentStore for MemoryStore {
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let mut tables = self.tables.write().await;
        let at = now();
        let row = Candidate {
            id: Uuid::new_v4(),
            full_name: candidate.full_name,
            email: candidate.email,
            phone: candidate.phone,
            tax_id: candidate.tax_id,
            desired_role: candidate.desired_role,
            message: candidate.message,
            resume_url: candidate.resume_url,
            job_id: candidate.job_id,
            current_stage: None,
            status: CandidateStatus::New,
            talent_pool: false,
            sector_of_interest: None,
            talent_notes: None,
            created_at: at,
            updated_at: at,
        };
        tables.candidates.push(row.clone());
        Ok(row)
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let tables = self.tables.read().await;
        Ok(tables.candidates.iter().find(|c| c.id == id).cloned())
    }

    async fn find_candidate_by_tax_id(&self, tax_id: &str) -> Result<Option<Candidate>> {
        let tables = self.tables.read().await;
        let wanted = digits_only(tax_id);
        Ok(tables
            .candidates
            .iter()
            .find(|c| c.tax_id.as_deref().map(digits_only).as_deref() == Some(wanted.as_str()))
            .cloned())
    }

    async fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Candidate> = tables
            .candidates
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        newest_first(&mut rows, |c| c.created_at);
        Ok(rows)
    }

    async fn update_candidate(
        &self,
        id: Uuid,
        changes: &CandidateChanges,
    ) -> Result<Option<Candidate>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.candidates.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        changes.apply(row, now());
        Ok(Some(row.clone()))
    }

    async fn delete_candidate(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.candidates.len();
        tables.candidates.retain(|c| c.id != id);
        let removed = tables.candidates.len() != before;
        if removed {
            tables
                .stage_records
                .retain(|r| r.candidate_id != id || r.history_id.is_some());
        }
        Ok(removed)
    }

    async fn append_stage_record(&self, record: NewStageRecord) -> Result<StageRecord> {
        let mut tables = self.tables.write().await;
        tables.append_stage_record(record)
    }

    async fn stage_records(&self, candidate_id: Uuid) -> Result<Vec<StageRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .stage_records
            .iter()
            .filter(|r| r.candidate_id == candidate_id && r.history_id.is_none())
            .cloned()
            .collect())
    }

    async fn stage_records_for(&self, candidate_ids: &[Uuid]) -> Result<Vec<StageRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .stage_records
            .iter()
            .filter(|r| r.history_id.is_none() && candidate_ids.contains(&r.candidate_id))
            .cloned()
            .collect())
    }

    async fn archive_candidate(
        &self,
        candidate_id: Uuid,
        record: NewHistoryRecord,
    ) -> Result<HistoryRecord> {
        let mut tables = self.tables.write().await;
        tables.archive_candidate(candidate_id, record)
    }

    async fn reject_candidate(
        &self,
        stage: NewStageRecord,
        record: NewHistoryRecord,
    ) -> Result<(StageRecord, HistoryRecord)> {
        let mut tables = self.tables.write().await;
        let candidate_id = stage.candidate_id;
        let mut appended = tables.append_stage_record(stage)?;
        let history = tables.archive_candidate(candidate_id, record)?;
        appended.history_id = Some(history.id);
        Ok((appended, history))
    }

    async fn history_stage_records(&self, history_id: Uuid) -> Result<Vec<StageRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .stage_records
            .iter()
            .filter(|r| r.history_id == Some(history_id))
            .cloned()
            .collect())
    }

    async fn lookup_history(&self, lookup: &HistoryLookup) -> Result<Vec<HistoryRecord>> {
        if lookup.is_empty() {
            return Ok(Vec::new());
        }
        let tables = self.tables.read().await;
        let mut rows: Vec<HistoryRecord> = tables
            .history
            .iter()
            .filter(|r| lookup.matches(r))
            .cloned()
            .collect();
        newest_first(&mut rows, |r| r.application_date);
        Ok(rows)
    }

    async fn list_history(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<HistoryRecord> = tables
            .history
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        newest_first(&mut rows, |r| r.application_date);
        Ok(rows)
    }

    async fn get_history(&self, id: Uuid) -> Result<Option<HistoryRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.history.iter().find(|r| r.id == id).cloned())
    }

    async fn insert_job(&self, job: NewJob) -> Result<Job> {
        let mut tables = self.tables.write().await;
        let at = now();
        let row = Job {
            id: Uuid::new_v4(),
            title: job.title,
            description: job.description,
            responsibilities: job.responsibilities,
            benefits: job.benefits,
            requirements: job.requirements,
            location: job.location,
            active: job.active,
            created_at: at,
            updated_at: at,
        };
        tables.jobs.push(row.clone());
        Ok(row)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        let tables = self.tables.read().await;
        Ok(tables.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list_jobs(
        &self,
        filter: &JobFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Job>, i64)> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Job> = tables
            .jobs
            .iter()
            .filter(|j| filter.active.map(|a| j.active == a).unwrap_or(true))
            .filter(|j| match &filter.search {
                Some(search) => {
                    contains_ignore_case(&j.title, search)
                        || j.location
                            .as_deref()
                            .map(|l| contains_ignore_case(l, search))
                            .unwrap_or(false)
                }
                None => true,
            })
            .cloned()
            .collect();
        newest_first(&mut rows, |j| j.created_at);
        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn update_job(&self, id: Uuid, changes: &JobChanges) -> Result<Option<Job>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.jobs.iter_mut().find(|j| j.id == id) else {
            return Ok(None);
        };
        changes.apply(row, now());
        Ok(Some(row.clone()))
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.jobs.len();
        tables.jobs.retain(|j| j.id != id);
        Ok(tables.jobs.len() != before)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(Error::Conflict("A user with this email already exists".to_string()));
        }
        let row = User {
            id: Uuid::new_v4(),
            email: user.email.to_lowercase(),
            full_name: user.full_name,
            password_hash: user.password_hash,
            role: user.role,
            theme: Theme::default(),
            created_at: now(),
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn set_user_theme(&self, id: Uuid, theme: Theme) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        row.theme = theme;
        Ok(Some(row.clone()))
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
        let mut tables = self.tables.write().await;
        let row = Notification {
            id: Uuid::new_v4(),
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            candidate_id: notification.candidate_id,
            read_at: None,
            created_at: now(),
        };
        tables.notifications.push(row.clone());
        Ok(row)
    }

    async fn list_notifications(
        &self,
        unread_only: bool,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| !unread_only || n.read_at.is_none())
            .filter(|n| since.map(|s| n.created_at > s).unwrap_or(true))
            .cloned()
            .collect();
        newest_first(&mut rows, |n| n.created_at);
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn count_unread_notifications(&self) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.read_at.is_none())
            .count() as i64)
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.notifications.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        if row.read_at.is_none() {
            row.read_at = Some(now());
        }
        Ok(true)
    }

    async fn mark_all_notifications_read(&self) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let at = now();
        let mut count = 0;
        for row in tables.notifications.iter_mut().filter(|n| n.read_at.is_none()) {
            row.read_at = Some(at);
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history::FinalStatus;
    use crate::models::stage::PipelineStage;

    fn new_candidate(name: &str, tax_id: Option<&str>) -> NewCandidate {
        NewCandidate {
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            tax_id: tax_id.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn archive_moves_candidate_into_history() {
        let store = MemoryStore::new();
        let c = store
            .insert_candidate(new_candidate("Ana Souza", Some("52998224725")))
            .await
            .unwrap();
        let record = NewHistoryRecord::from_candidate(
            &c,
            FinalStatus::Rejected,
            None,
            None,
            Some("x".into()),
        );
        store.archive_candidate(c.id, record.clone()).await.unwrap();

        assert!(store.get_candidate(c.id).await.unwrap().is_none());
        let found = store
            .lookup_history(&HistoryLookup::new(None, None, Some("52998224725")))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let again = store.archive_candidate(c.id, record).await;
        assert!(matches!(again, Err(Error::NotFound(_))));
        assert_eq!(store.list_history(&HistoryFilter::default()).await.unwrap().len(), 1);
    }

    fn stage(candidate_id: Uuid, stage: PipelineStage) -> NewStageRecord {
        NewStageRecord {
            candidate_id,
            stage,
            score: None,
            notes: None,
            rejection_reason: None,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn rejection_keeps_the_stage_log_under_history() {
        let store = MemoryStore::new();
        let c = store.insert_candidate(new_candidate("Ana", None)).await.unwrap();
        store
            .append_stage_record(stage(c.id, PipelineStage::Triagem))
            .await
            .unwrap();
        let record = NewHistoryRecord::from_candidate(
            &c,
            FinalStatus::Rejected,
            None,
            None,
            Some("x".into()),
        );
        let (appended, history) = store
            .reject_candidate(stage(c.id, PipelineStage::Reprovado), record)
            .await
            .unwrap();

        assert_eq!(appended.history_id, Some(history.id));
        assert!(store.stage_records(c.id).await.unwrap().is_empty());
        let log = store.history_stage_records(history.id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|r| r.history_id == Some(history.id)));
    }

    #[tokio::test]
    async fn rejecting_a_missing_candidate_writes_nothing() {
        let store = MemoryStore::new();
        let c = store.insert_candidate(new_candidate("Ana", None)).await.unwrap();
        let record = NewHistoryRecord::from_candidate(&c, FinalStatus::Rejected, None, None, None);
        store.delete_candidate(c.id).await.unwrap();

        let result = store
            .reject_candidate(stage(c.id, PipelineStage::Reprovado), record)
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        let tables = store.tables.read().await;
        assert!(tables.stage_records.is_empty());
        assert!(tables.history.is_empty());
    }

    #[tokio::test]
    async fn empty_lookup_returns_nothing() {
        let store = MemoryStore::new();
        let c = store.insert_candidate(new_candidate("Ana", None)).await.unwrap();
        let record = NewHistoryRecord::from_candidate(&c, FinalStatus::Withdrawn, None, None, None);
        store.archive_candidate(c.id, record).await.unwrap();
        let found = store.lookup_history(&HistoryLookup::default()).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn jobs_are_paged_with_total() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert_job(NewJob {
                    title: format!("Vaga {}", i),
                    description: None,
                    responsibilities: vec![],
                    benefits: vec![],
                    requirements: vec![],
                    location: None,
                    active: i % 2 == 0,
                })
                .await
                .unwrap();
        }
        let (page, total) = store.list_jobs(&JobFilter::default(), 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(total, 5);

        let active = JobFilter {
            active: Some(true),
            search: None,
        };
        let (_, total) = store.list_jobs(&active, 10, 0).await.unwrap();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn notifications_mark_read() {
        let store = MemoryStore::new();
        let n = store
            .insert_notification(NewNotification {
                kind: "stage_changed".into(),
                title: "t".into(),
                message: "m".into(),
                candidate_id: None,
            })
            .await
            .unwrap();
        assert_eq!(store.count_unread_notifications().await.unwrap(), 1);
        assert!(store.mark_notification_read(n.id).await.unwrap());
        assert_eq!(store.count_unread_notifications().await.unwrap(), 0);
        assert!(!store.mark_notification_read(Uuid::new_v4()).await.unwrap());
    }
}
