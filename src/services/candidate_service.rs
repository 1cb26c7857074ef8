use std::collections::HashMap;
use uuid::Uuid;

use crate::dto::candidate_dto::{CreateCandidatePayload, UpdateCandidatePayload};
use crate::dto::public_dto::ApplicationForm;
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateChanges, CandidateFilter, NewCandidate};
use crate::models::stage::{project_current_stage, StageRecord};
use crate::services::change_feed::{ChangeAction, ChangeFeed};
use crate::services::history_service::{DuplicateReport, HistoryService};
use crate::services::notification_service::{
    NotificationService, KIND_NEW_APPLICATION, KIND_POSSIBLE_DUPLICATE,
};
use crate::services::resume_service::{check_resume, ResumeService, ResumeUpload};
use crate::store::SharedStore;
use crate::utils::cpf::Cpf;

const TABLE: &str = "candidates";

#[derive(Clone)]
pub struct CandidateService {
    store: SharedStore,
    history: HistoryService,
    notifications: NotificationService,
    resumes: ResumeService,
    feed: ChangeFeed,
}

impl CandidateService {
    pub fn new(
        store: SharedStore,
        history: HistoryService,
        notifications: NotificationService,
        resumes: ResumeService,
        feed: ChangeFeed,
    ) -> Self {
        Self {
            store,
            history,
            notifications,
            resumes,
            feed,
        }
    }

    pub async fn create(&self, payload: CreateCandidatePayload) -> Result<Candidate> {
        let tax_id = parse_tax_id(payload.tax_id.as_deref())?;
        self.ensure_tax_id_free(tax_id.as_ref(), None).await?;
        if let Some(job_id) = payload.job_id {
            self.ensure_job_exists(job_id).await?;
        }

        let report = self
            .history
            .check_duplicates(
                Some(&payload.full_name),
                payload.phone.as_deref(),
                tax_id.as_ref().map(Cpf::digits),
            )
            .await?;
        if !report.is_empty() {
            if !payload.force {
                tracing::info!(
                    matches = report.matches.len(),
                    "candidate creation held for duplicate review"
                );
                return Err(Error::DuplicateCandidate(report));
            }
            tracing::info!(
                matches = report.matches.len(),
                "creating candidate despite previous applications"
            );
        }

        let candidate = self
            .store
            .insert_candidate(NewCandidate {
                full_name: payload.full_name.trim().to_string(),
                email: payload.email.trim().to_lowercase(),
                phone: non_blank(payload.phone),
                tax_id: tax_id.map(|c| c.digits().to_string()),
                desired_role: non_blank(payload.desired_role),
                message: non_blank(payload.message),
                resume_url: None,
                job_id: payload.job_id,
            })
            .await?;
        tracing::info!(candidate_id = %candidate.id, "candidate created");
        self.feed.publish(TABLE, ChangeAction::Insert, candidate.id);
        Ok(candidate)
    }

    pub async fn get(&self, id: Uuid) -> Result<Candidate> {
        let candidate = self.find(id).await?;
        let records = self.store.stage_records(id).await?;
        Ok(with_projected_stage(candidate, &records))
    }

    pub async fn list(&self, filter: CandidateFilter) -> Result<Vec<Candidate>> {
        let candidates = self.store.list_candidates(&filter).await?;
        project_stages(&self.store, candidates).await
    }

    pub async fn update(&self, id: Uuid, payload: UpdateCandidatePayload) -> Result<Candidate> {
        self.find(id).await?;
        let tax_id = parse_tax_id(payload.tax_id.as_deref())?;
        self.ensure_tax_id_free(tax_id.as_ref(), Some(id)).await?;
        if let Some(job_id) = payload.job_id {
            self.ensure_job_exists(job_id).await?;
        }

        let changes = CandidateChanges {
            full_name: payload.full_name.map(|v| v.trim().to_string()),
            email: payload.email.map(|v| v.trim().to_lowercase()),
            phone: payload.phone,
            tax_id: tax_id.map(|c| c.digits().to_string()),
            desired_role: payload.desired_role,
            message: payload.message,
            job_id: payload.job_id,
            ..Default::default()
        };
        let candidate = self
            .store
            .update_candidate(id, &changes)
            .await?
            .ok_or_else(candidate_not_found)?;
        self.feed.publish(TABLE, ChangeAction::Update, id);
        let records = self.store.stage_records(id).await?;
        Ok(with_projected_stage(candidate, &records))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_candidate(id).await? {
            return Err(candidate_not_found());
        }
        tracing::info!(candidate_id = %id, "candidate deleted");
        self.feed.publish(TABLE, ChangeAction::Delete, id);
        Ok(())
    }

    pub async fn attach_resume(&self, id: Uuid, upload: ResumeUpload) -> Result<Candidate> {
        let previous = self.find(id).await?.resume_url;
        let url = self.resumes.save(&upload).await?;
        let changes = CandidateChanges {
            resume_url: Some(url.clone()),
            ..Default::default()
        };
        let candidate = match self.store.update_candidate(id, &changes).await {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                self.resumes.remove(&url).await;
                return Err(candidate_not_found());
            }
            Err(e) => {
                self.resumes.remove(&url).await;
                return Err(e);
            }
        };
        if let Some(old) = previous.filter(|old| *old != url) {
            self.resumes.remove(&old).await;
        }
        self.feed.publish(TABLE, ChangeAction::Update, id);
        Ok(candidate)
    }

    pub async fn check_duplicates(
        &self,
        name: Option<&str>,
        phone: Option<&str>,
        tax_id: Option<&str>,
    ) -> Result<DuplicateReport> {
        self.history.check_duplicates(name, phone, tax_id).await
    }

    /// Public intake. Previous applications do not block the insert; they
    /// raise a notification for the recruiters instead.
    pub async fn submit_application(
        &self,
        form: ApplicationForm,
        resume: Option<ResumeUpload>,
    ) -> Result<Candidate> {
        let tax_id = parse_tax_id(form.tax_id.as_deref())?;
        self.ensure_tax_id_free(tax_id.as_ref(), None).await?;
        if let Some(job_id) = form.job_id {
            self.ensure_job_exists(job_id).await?;
        }
        if let Some(upload) = &resume {
            check_resume(upload)?;
        }

        let report = self
            .history
            .check_duplicates(
                Some(&form.full_name),
                form.phone.as_deref(),
                tax_id.as_ref().map(Cpf::digits),
            )
            .await?;

        let resume_url = match &resume {
            Some(upload) => Some(self.resumes.save(upload).await?),
            None => None,
        };
        let inserted = self
            .store
            .insert_candidate(NewCandidate {
                full_name: form.full_name,
                email: form.email.to_lowercase(),
                phone: form.phone,
                tax_id: tax_id.map(|c| c.digits().to_string()),
                desired_role: form.desired_role,
                message: form.message,
                resume_url: resume_url.clone(),
                job_id: form.job_id,
            })
            .await;
        let candidate = match inserted {
            Ok(candidate) => candidate,
            Err(e) => {
                if let Some(url) = &resume_url {
                    self.resumes.remove(url).await;
                }
                return Err(e);
            }
        };
        tracing::info!(candidate_id = %candidate.id, "public application received");
        self.feed.publish(TABLE, ChangeAction::Insert, candidate.id);

        self.notifications
            .notify(
                KIND_NEW_APPLICATION,
                "Nova candidatura",
                format!("{} enviou uma candidatura", candidate.full_name),
                Some(candidate.id),
            )
            .await;
        if !report.is_empty() {
            self.notifications
                .notify(
                    KIND_POSSIBLE_DUPLICATE,
                    "Possível candidato duplicado",
                    duplicate_summary(&candidate.full_name, &report),
                    Some(candidate.id),
                )
                .await;
        }
        Ok(candidate)
    }

    async fn find(&self, id: Uuid) -> Result<Candidate> {
        self.store
            .get_candidate(id)
            .await?
            .ok_or_else(candidate_not_found)
    }

    async fn ensure_tax_id_free(&self, tax_id: Option<&Cpf>, except: Option<Uuid>) -> Result<()> {
        let Some(tax_id) = tax_id else {
            return Ok(());
        };
        match self.store.find_candidate_by_tax_id(tax_id.digits()).await? {
            Some(existing) if Some(existing.id) != except => Err(Error::Conflict(format!(
                "An active candidate with CPF {} already exists",
                tax_id
            ))),
            _ => Ok(()),
        }
    }

    async fn ensure_job_exists(&self, job_id: Uuid) -> Result<()> {
        match self.store.get_job(job_id).await? {
            Some(_) => Ok(()),
            None => Err(Error::BadRequest(format!("Job {} does not exist", job_id))),
        }
    }
}

fn candidate_not_found() -> Error {
    Error::NotFound("Candidate not found".to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Empty input means no CPF. Anything else must be a valid CPF.
fn parse_tax_id(raw: Option<&str>) -> Result<Option<Cpf>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => Cpf::parse(value)
            .map(Some)
            .ok_or_else(|| Error::InvalidCpf(value.to_string())),
        None => Ok(None),
    }
}

fn duplicate_summary(name: &str, report: &DuplicateReport) -> String {
    let mut flags = Vec::new();
    if report.has_been_rejected {
        flags.push("já reprovado");
    }
    if report.has_talent_pool {
        flags.push("banco de talentos");
    }
    if report.has_withdrawn {
        flags.push("desistente");
    }
    let mut message = format!(
        "{} tem {} candidatura(s) anterior(es)",
        name,
        report.matches.len()
    );
    if !flags.is_empty() {
        message.push_str(&format!(" ({})", flags.join(", ")));
    }
    message
}

pub(crate) fn with_projected_stage(mut candidate: Candidate, records: &[StageRecord]) -> Candidate {
    if let Some(stage) = project_current_stage(records) {
        candidate.current_stage = Some(stage);
    }
    candidate
}

/// Recomputes the stage of each candidate from the stage log.
pub(crate) async fn project_stages(
    store: &SharedStore,
    candidates: Vec<Candidate>,
) -> Result<Vec<Candidate>> {
    if candidates.is_empty() {
        return Ok(candidates);
    }
    let ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
    let mut by_candidate: HashMap<Uuid, Vec<StageRecord>> = HashMap::new();
    for record in store.stage_records_for(&ids).await? {
        by_candidate.entry(record.candidate_id).or_default().push(record);
    }
    Ok(candidates
        .into_iter()
        .map(|c| {
            let records = by_candidate.remove(&c.id).unwrap_or_default();
            with_projected_stage(c, &records)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history::{FinalStatus, NewHistoryRecord};
    use crate::store::{MemoryStore, MockRecruitmentStore, RecruitmentStore};
    use std::sync::Arc;

    fn service(store: SharedStore) -> CandidateService {
        service_in(store, std::env::temp_dir().join("candidate-service-tests"))
    }

    fn service_in(store: SharedStore, uploads: std::path::PathBuf) -> CandidateService {
        let feed = ChangeFeed::new(16);
        CandidateService::new(
            store.clone(),
            HistoryService::new(store.clone()),
            NotificationService::new(store, feed.clone()),
            ResumeService::new(uploads),
            feed,
        )
    }

    fn scratch_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("candidate-uploads-{}", Uuid::new_v4()))
    }

    fn pdf() -> ResumeUpload {
        ResumeUpload {
            file_name: "cv.pdf".to_string(),
            data: bytes::Bytes::from_static(b"%PDF-1.4"),
        }
    }

    async fn stored_files(root: &std::path::Path) -> Vec<String> {
        let mut names = Vec::new();
        let Ok(mut dir) = tokio::fs::read_dir(root.join("resumes")).await else {
            return names;
        };
        while let Some(entry) = dir.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names
    }

    fn payload(name: &str, tax_id: Option<&str>) -> CreateCandidatePayload {
        CreateCandidatePayload {
            full_name: name.to_string(),
            email: "pessoa@example.com".to_string(),
            phone: None,
            tax_id: tax_id.map(str::to_string),
            desired_role: Some("Analista".to_string()),
            message: None,
            job_id: None,
            force: false,
        }
    }

    async fn archive(store: &Arc<MemoryStore>, name: &str, tax_id: &str, status: FinalStatus) {
        let c = store
            .insert_candidate(NewCandidate {
                full_name: name.to_string(),
                email: "old@example.com".to_string(),
                tax_id: Some(tax_id.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .archive_candidate(c.id, NewHistoryRecord::from_candidate(&c, status, None, None, None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stores_cpf_as_digits() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let svc = service(store);
        let c = svc
            .create(payload("Ana Souza", Some("529.982.247-25")))
            .await
            .unwrap();
        assert_eq!(c.tax_id.as_deref(), Some("52998224725"));
    }

    #[tokio::test]
    async fn invalid_cpf_is_rejected_before_insert() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        let err = svc
            .create(payload("Ana Souza", Some("529.982.247-26")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCpf(_)));
        assert!(store
            .list_candidates(&CandidateFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn active_cpf_is_a_hard_conflict() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let svc = service(store);
        svc.create(payload("Ana Souza", Some("52998224725"))).await.unwrap();
        let mut again = payload("Outra Pessoa", Some("52998224725"));
        again.force = true;
        assert!(matches!(svc.create(again).await, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn previous_applications_hold_creation_until_forced() {
        let store = Arc::new(MemoryStore::new());
        archive(&store, "Ana Souza", "52998224725", FinalStatus::Rejected).await;
        let svc = service(store.clone());

        let err = svc
            .create(payload("Ana Souza", Some("52998224725")))
            .await
            .unwrap_err();
        match err {
            Error::DuplicateCandidate(report) => {
                assert_eq!(report.matches.len(), 1);
                assert!(report.has_been_rejected);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let mut forced = payload("Ana Souza", Some("52998224725"));
        forced.force = true;
        let created = svc.create(forced).await.unwrap();
        assert_eq!(created.full_name, "Ana Souza");
    }

    #[tokio::test]
    async fn public_intake_flags_duplicates_instead_of_blocking() {
        let store = Arc::new(MemoryStore::new());
        archive(&store, "Ana Souza", "52998224725", FinalStatus::Withdrawn).await;
        let svc = service(store.clone());
        let form = ApplicationForm {
            full_name: "Ana Souza".into(),
            email: "ana@example.com".into(),
            tax_id: Some("529.982.247-25".into()),
            ..Default::default()
        };
        let c = svc.submit_application(form, None).await.unwrap();
        let kinds: Vec<String> = store
            .list_notifications(false, None, 10)
            .await
            .unwrap()
            .into_iter()
            .filter(|n| n.candidate_id == Some(c.id))
            .map(|n| n.kind)
            .collect();
        assert!(kinds.iter().any(|k| k == KIND_NEW_APPLICATION));
        assert!(kinds.iter().any(|k| k == KIND_POSSIBLE_DUPLICATE));
    }

    #[tokio::test]
    async fn failed_intake_insert_removes_the_saved_resume() {
        let mut mock = MockRecruitmentStore::new();
        mock.expect_lookup_history().returning(|_| Ok(Vec::new()));
        mock.expect_insert_candidate()
            .times(1)
            .returning(|_| Err(Error::Internal("connection reset".into())));
        mock.expect_insert_notification().times(0);
        let root = scratch_dir();
        let svc = service_in(Arc::new(mock), root.clone());

        let form = ApplicationForm {
            full_name: "Ana Souza".into(),
            email: "ana@example.com".into(),
            ..Default::default()
        };
        let err = svc.submit_application(form, Some(pdf())).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert!(stored_files(&root).await.is_empty());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn replacing_a_resume_removes_the_old_file() {
        let store = Arc::new(MemoryStore::new());
        let root = scratch_dir();
        let svc = service_in(store.clone(), root.clone());
        let c = svc.create(payload("Ana Souza", None)).await.unwrap();

        let first = svc.attach_resume(c.id, pdf()).await.unwrap();
        let second = svc.attach_resume(c.id, pdf()).await.unwrap();
        let first_url = first.resume_url.unwrap();
        let second_url = second.resume_url.unwrap();
        assert_ne!(first_url, second_url);

        let files = stored_files(&root).await;
        assert_eq!(files.len(), 1);
        assert!(second_url.ends_with(&files[0]));
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn failed_resume_update_removes_the_new_file() {
        let seed = Arc::new(MemoryStore::new());
        let c = seed
            .insert_candidate(NewCandidate {
                full_name: "Ana Souza".into(),
                email: "ana@example.com".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let mut mock = MockRecruitmentStore::new();
        mock.expect_get_candidate()
            .returning(move |_| Ok(Some(c.clone())));
        mock.expect_update_candidate()
            .returning(|_, _| Err(Error::Internal("connection reset".into())));
        let root = scratch_dir();
        let svc = service_in(Arc::new(mock), root.clone());

        let err = svc.attach_resume(Uuid::new_v4(), pdf()).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert!(stored_files(&root).await.is_empty());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn missing_candidate_is_not_found() {
        let mut mock = MockRecruitmentStore::new();
        mock.expect_get_candidate().returning(|_| Ok(None));
        let svc = service(Arc::new(mock));
        assert!(matches!(svc.get(Uuid::new_v4()).await, Err(Error::NotFound(_))));
    }

    #[test]
    fn blank_tax_id_means_none() {
        assert!(parse_tax_id(Some("  ")).unwrap().is_none());
        assert!(parse_tax_id(None).unwrap().is_none());
        assert!(matches!(parse_tax_id(Some("123")), Err(Error::InvalidCpf(_))));
    }
}
