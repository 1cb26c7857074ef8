use uuid::Uuid;

use crate::dto::job_dto::{CreateJobPayload, JobListQuery, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::job::{Job, JobChanges, JobFilter, NewJob};
use crate::services::change_feed::{ChangeAction, ChangeFeed};
use crate::store::SharedStore;
use crate::utils::text::split_lines;

const TABLE: &str = "jobs";

#[derive(Clone)]
pub struct JobService {
    store: SharedStore,
    feed: ChangeFeed,
}

pub struct JobList {
    pub items: Vec<Job>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl JobService {
    pub fn new(store: SharedStore, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }

    pub async fn create(&self, payload: CreateJobPayload) -> Result<Job> {
        let job = self
            .store
            .insert_job(NewJob {
                title: payload.title.trim().to_string(),
                description: payload.description,
                responsibilities: lines(payload.responsibilities),
                benefits: lines(payload.benefits),
                requirements: lines(payload.requirements),
                location: payload.location,
                active: payload.active.unwrap_or(true),
            })
            .await?;
        tracing::info!(job_id = %job.id, "job created");
        self.feed.publish(TABLE, ChangeAction::Insert, job.id);
        Ok(job)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateJobPayload) -> Result<Job> {
        let changes = JobChanges {
            title: payload.title.map(|t| t.trim().to_string()),
            description: payload.description,
            responsibilities: payload.responsibilities.as_deref().map(split_lines),
            benefits: payload.benefits.as_deref().map(split_lines),
            requirements: payload.requirements.as_deref().map(split_lines),
            location: payload.location,
            active: payload.active,
        };
        self.apply(id, &changes).await
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<Job> {
        let changes = JobChanges {
            active: Some(active),
            ..Default::default()
        };
        self.apply(id, &changes).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Job> {
        self.store.get_job(id).await?.ok_or_else(job_not_found)
    }

    pub async fn list(&self, query: JobListQuery) -> Result<JobList> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        let filter = JobFilter {
            active: query.active,
            search: query.search.filter(|s| !s.trim().is_empty()),
        };

        let (items, total) = self.store.list_jobs(&filter, per_page, offset).await?;
        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

        Ok(JobList {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    /// Open positions for the public careers page.
    pub async fn list_active(&self, limit: i64) -> Result<Vec<Job>> {
        let limit = if limit <= 0 { 20 } else { limit.min(100) };
        let filter = JobFilter {
            active: Some(true),
            search: None,
        };
        let (items, _) = self.store.list_jobs(&filter, limit, 0).await?;
        Ok(items)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_job(id).await? {
            return Err(job_not_found());
        }
        self.feed.publish(TABLE, ChangeAction::Delete, id);
        Ok(())
    }

    async fn apply(&self, id: Uuid, changes: &JobChanges) -> Result<Job> {
        let job = self
            .store
            .update_job(id, changes)
            .await?
            .ok_or_else(job_not_found)?;
        self.feed.publish(TABLE, ChangeAction::Update, id);
        Ok(job)
    }
}

fn lines(text: Option<String>) -> Vec<String> {
    text.as_deref().map(split_lines).unwrap_or_default()
}

fn job_not_found() -> Error {
    Error::NotFound("Job not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn service() -> JobService {
        JobService::new(Arc::new(MemoryStore::new()), ChangeFeed::new(8))
    }

    fn payload(title: &str) -> CreateJobPayload {
        CreateJobPayload {
            title: title.to_string(),
            description: None,
            responsibilities: Some("- Atender clientes\n\n- Emitir notas\n".to_string()),
            benefits: None,
            requirements: Some("Ensino médio".to_string()),
            location: Some("São Paulo".to_string()),
            active: None,
        }
    }

    #[tokio::test]
    async fn free_text_lists_are_split() {
        let svc = service();
        let job = svc.create(payload("Assistente")).await.unwrap();
        assert_eq!(job.responsibilities, vec!["Atender clientes", "Emitir notas"]);
        assert_eq!(job.requirements, vec!["Ensino médio"]);
        assert!(job.benefits.is_empty());
        assert!(job.active);
    }

    #[tokio::test]
    async fn inactive_jobs_leave_the_public_list() {
        let svc = service();
        let a = svc.create(payload("A")).await.unwrap();
        svc.create(payload("B")).await.unwrap();
        svc.set_active(a.id, false).await.unwrap();
        let open = svc.list_active(10).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "B");
    }

    #[tokio::test]
    async fn paging_reports_total_pages() {
        let svc = service();
        for i in 0..5 {
            svc.create(payload(&format!("Vaga {}", i))).await.unwrap();
        }
        let list = svc
            .list(JobListQuery {
                page: Some(2),
                per_page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.total, 5);
        assert_eq!(list.total_pages, 3);
    }

    #[tokio::test]
    async fn deleting_a_missing_job_is_not_found() {
        let svc = service();
        assert!(matches!(svc.delete(Uuid::new_v4()).await, Err(Error::NotFound(_))));
    }
}
