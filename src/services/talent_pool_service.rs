use uuid::Uuid;

use crate::dto::talent_pool_dto::{ArchiveCandidatePayload, FlagTalentPayload};
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateChanges, CandidateFilter};
use crate::models::history::{FinalStatus, HistoryRecord, NewHistoryRecord};
use crate::models::stage::project_current_stage;
use crate::services::candidate_service::project_stages;
use crate::services::change_feed::{ChangeAction, ChangeFeed};
use crate::services::notification_service::{NotificationService, KIND_PROPOSAL_RESPONSE};
use crate::store::SharedStore;
use crate::utils::time::{note_stamp, now};

pub const PROPOSAL_DECLINED_NOTE: &str = "Proposta recusada pelo candidato";

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProposalOutcome {
    Accepted { history: HistoryRecord },
    Declined { candidate: Candidate },
}

#[derive(Clone)]
pub struct TalentPoolService {
    store: SharedStore,
    notifications: NotificationService,
    feed: ChangeFeed,
}

impl TalentPoolService {
    pub fn new(store: SharedStore, notifications: NotificationService, feed: ChangeFeed) -> Self {
        Self {
            store,
            notifications,
            feed,
        }
    }

    /// Keeps the application active and marks the person for future roles.
    pub async fn flag(&self, candidate_id: Uuid, payload: FlagTalentPayload) -> Result<Candidate> {
        let sector = payload.sector_of_interest.trim().to_string();
        if sector.is_empty() {
            return Err(Error::BadRequest("A sector of interest is required".to_string()));
        }
        let changes = CandidateChanges {
            talent_pool: Some(true),
            sector_of_interest: Some(sector),
            talent_notes: payload.notes.filter(|n| !n.trim().is_empty()),
            ..Default::default()
        };
        self.apply(candidate_id, &changes).await
    }

    pub async fn unflag(&self, candidate_id: Uuid) -> Result<Candidate> {
        let changes = CandidateChanges {
            talent_pool: Some(false),
            ..Default::default()
        };
        self.apply(candidate_id, &changes).await
    }

    pub async fn list(&self, sector: Option<String>) -> Result<Vec<Candidate>> {
        let filter = CandidateFilter {
            talent_pool: Some(true),
            sector: sector.filter(|s| !s.trim().is_empty()),
            ..Default::default()
        };
        let candidates = self.store.list_candidates(&filter).await?;
        project_stages(&self.store, candidates).await
    }

    pub async fn respond_to_proposal(
        &self,
        candidate_id: Uuid,
        accepted: bool,
    ) -> Result<ProposalOutcome> {
        let candidate = self.find(candidate_id).await?;
        if accepted {
            let history = self
                .close(&candidate, FinalStatus::Approved, candidate.talent_notes.clone())
                .await?;
            self.notifications
                .notify(
                    KIND_PROPOSAL_RESPONSE,
                    "Proposta aceita",
                    format!("{} aceitou a proposta", history.full_name),
                    None,
                )
                .await;
            return Ok(ProposalOutcome::Accepted { history });
        }

        let notes = append_note(
            candidate.talent_notes.as_deref(),
            &format!("[{}] {}", note_stamp(now()), PROPOSAL_DECLINED_NOTE),
        );
        let changes = CandidateChanges {
            talent_pool: Some(true),
            talent_notes: Some(notes),
            ..Default::default()
        };
        let updated = self.apply(candidate_id, &changes).await?;
        self.notifications
            .notify(
                KIND_PROPOSAL_RESPONSE,
                "Proposta recusada",
                format!("{} recusou a proposta", updated.full_name),
                Some(candidate_id),
            )
            .await;
        Ok(ProposalOutcome::Declined { candidate: updated })
    }

    /// Closes an application that left the process without a pipeline
    /// decision.
    pub async fn archive(
        &self,
        candidate_id: Uuid,
        payload: ArchiveCandidatePayload,
    ) -> Result<HistoryRecord> {
        let final_status: FinalStatus = payload
            .final_status
            .parse()
            .map_err(Error::BadRequest)?;
        if !matches!(final_status, FinalStatus::Withdrawn | FinalStatus::TalentPool) {
            return Err(Error::BadRequest(format!(
                "Use the pipeline to close an application as {}",
                final_status
            )));
        }
        let candidate = self.find(candidate_id).await?;
        let notes = payload
            .notes
            .filter(|n| !n.trim().is_empty())
            .or_else(|| candidate.talent_notes.clone());
        self.close(&candidate, final_status, notes).await
    }

    async fn close(
        &self,
        candidate: &Candidate,
        final_status: FinalStatus,
        notes: Option<String>,
    ) -> Result<HistoryRecord> {
        let records = self.store.stage_records(candidate.id).await?;
        let stage = project_current_stage(&records).or(candidate.current_stage);
        let score = records.iter().rev().find_map(|r| r.score);
        let draft = NewHistoryRecord::from_candidate(candidate, final_status, stage, score, notes);
        let history = self.store.archive_candidate(candidate.id, draft).await?;
        tracing::info!(candidate_id = %candidate.id, %final_status, "application archived");
        self.feed.publish("candidates", ChangeAction::Delete, candidate.id);
        self.feed
            .publish("candidate_history", ChangeAction::Insert, history.id);
        Ok(history)
    }

    async fn apply(&self, candidate_id: Uuid, changes: &CandidateChanges) -> Result<Candidate> {
        let candidate = self
            .store
            .update_candidate(candidate_id, changes)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        self.feed.publish("candidates", ChangeAction::Update, candidate_id);
        Ok(candidate)
    }

    async fn find(&self, candidate_id: Uuid) -> Result<Candidate> {
        self.store
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
    }
}

fn append_note(existing: Option<&str>, line: &str) -> String {
    match existing.map(str::trim_end).filter(|s| !s.is_empty()) {
        Some(prev) => format!("{}\n{}", prev, line),
        None => line.to_string(),
    }
}
