use serde::Serialize;
use uuid::Uuid;

use crate::dto::pipeline_dto::MoveStagePayload;
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateChanges, CandidateFilter, CandidateStatus};
use crate::models::history::{FinalStatus, HistoryRecord, NewHistoryRecord};
use crate::models::stage::{
    project_current_stage, score_in_range, NewStageRecord, PipelineStage, StageRecord,
};
use crate::services::candidate_service::project_stages;
use crate::services::change_feed::{ChangeAction, ChangeFeed};
use crate::services::notification_service::{
    NotificationService, KIND_CANDIDATE_HIRED, KIND_CANDIDATE_REJECTED, KIND_STAGE_CHANGED,
};
use crate::store::SharedStore;

const TABLE: &str = "candidates";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// Target equals the current stage. Nothing was written.
    Unchanged { candidate: Candidate },
    Moved {
        candidate: Candidate,
        record: StageRecord,
    },
    Hired {
        candidate: Candidate,
        record: StageRecord,
    },
    /// The active row is gone; the application and its stage log now
    /// belong to `history`.
    Rejected {
        record: StageRecord,
        history: HistoryRecord,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    pub stage: PipelineStage,
    pub label: &'static str,
    pub candidates: Vec<Candidate>,
}

/// Validated form of a move request.
struct StageMove {
    target: PipelineStage,
    score: Option<rust_decimal::Decimal>,
    notes: Option<String>,
    rejection_reason: Option<String>,
}

impl TryFrom<MoveStagePayload> for StageMove {
    type Error = Error;

    fn try_from(payload: MoveStagePayload) -> Result<Self> {
        let target: PipelineStage = payload
            .stage
            .parse()
            .map_err(|e: crate::models::stage::UnknownStage| Error::InvalidStage(e.0))?;
        if let Some(score) = payload.score {
            if !score_in_range(score) {
                return Err(Error::InvalidScore(score.to_string()));
            }
        }
        let rejection_reason = payload
            .rejection_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if target == PipelineStage::Reprovado && rejection_reason.is_none() {
            return Err(Error::BadRequest(
                "A rejection reason is required to reject a candidate".to_string(),
            ));
        }
        Ok(Self {
            target,
            score: payload.score,
            notes: payload.notes.filter(|n| !n.trim().is_empty()),
            rejection_reason,
        })
    }
}

#[derive(Clone)]
pub struct PipelineService {
    store: SharedStore,
    notifications: NotificationService,
    feed: ChangeFeed,
}

impl PipelineService {
    pub fn new(store: SharedStore, notifications: NotificationService, feed: ChangeFeed) -> Self {
        Self {
            store,
            notifications,
            feed,
        }
    }

    pub async fn move_to_stage(
        &self,
        candidate_id: Uuid,
        payload: MoveStagePayload,
        actor: Option<Uuid>,
    ) -> Result<TransitionOutcome> {
        let request = StageMove::try_from(payload)?;
        let mut candidate = self
            .store
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        let records = self.store.stage_records(candidate_id).await?;
        let current = project_current_stage(&records).or(candidate.current_stage);

        if current == Some(request.target) {
            tracing::debug!(%candidate_id, stage = %request.target, "stage unchanged");
            candidate.current_stage = current;
            return Ok(TransitionOutcome::Unchanged { candidate });
        }
        if let Some(stage) = current.filter(PipelineStage::is_terminal) {
            return Err(Error::Conflict(format!(
                "Candidate already left the pipeline at {}",
                stage
            )));
        }

        let stage_record = NewStageRecord {
            candidate_id,
            stage: request.target,
            score: request.score,
            notes: request.notes.clone(),
            rejection_reason: request.rejection_reason.clone(),
            created_by: actor,
        };
        if request.target == PipelineStage::Reprovado {
            let score = request
                .score
                .or_else(|| records.iter().rev().find_map(|r| r.score));
            let draft = NewHistoryRecord::from_candidate(
                &candidate,
                FinalStatus::Rejected,
                current,
                score,
                request.rejection_reason,
            );
            let (record, history) = self.store.reject_candidate(stage_record, draft).await?;
            tracing::info!(
                %candidate_id,
                from = ?current,
                history_id = %history.id,
                "candidate rejected"
            );
            self.feed
                .publish("stage_records", ChangeAction::Insert, record.id);
            self.feed.publish(TABLE, ChangeAction::Delete, candidate_id);
            self.feed
                .publish("candidate_history", ChangeAction::Insert, history.id);
            self.notifications
                .notify(
                    KIND_CANDIDATE_REJECTED,
                    "Candidato reprovado",
                    format!("{} foi reprovado e arquivado no histórico", history.full_name),
                    None,
                )
                .await;
            return Ok(TransitionOutcome::Rejected { record, history });
        }

        let record = self.store.append_stage_record(stage_record).await?;
        self.feed
            .publish("stage_records", ChangeAction::Insert, record.id);

        let changes = CandidateChanges {
            current_stage: Some(request.target),
            status: Some(CandidateStatus::for_stage(request.target)),
            ..Default::default()
        };
        let updated = self
            .store
            .update_candidate(candidate_id, &changes)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        self.feed.publish(TABLE, ChangeAction::Update, candidate_id);

        tracing::info!(
            %candidate_id,
            from = ?current,
            to = %request.target,
            "candidate moved"
        );

        if request.target == PipelineStage::Aprovado {
            self.notifications
                .notify(
                    KIND_CANDIDATE_HIRED,
                    "Candidato aprovado",
                    format!("{} foi aprovado", updated.full_name),
                    Some(candidate_id),
                )
                .await;
            return Ok(TransitionOutcome::Hired {
                candidate: updated,
                record,
            });
        }

        self.notifications
            .notify(
                KIND_STAGE_CHANGED,
                "Mudança de etapa",
                format!(
                    "{} avançou para {}",
                    updated.full_name,
                    request.target.label()
                ),
                Some(candidate_id),
            )
            .await;
        Ok(TransitionOutcome::Moved {
            candidate: updated,
            record,
        })
    }

    /// Stage log of one candidate, newest first.
    pub async fn stage_history(&self, candidate_id: Uuid) -> Result<Vec<StageRecord>> {
        if self.store.get_candidate(candidate_id).await?.is_none() {
            return Err(Error::NotFound("Candidate not found".to_string()));
        }
        let mut records = self.store.stage_records(candidate_id).await?;
        records.reverse();
        Ok(records)
    }

    pub async fn board(&self) -> Result<Vec<BoardColumn>> {
        let candidates = self.store.list_candidates(&CandidateFilter::default()).await?;
        let candidates = project_stages(&self.store, candidates).await?;
        Ok(group_into_columns(candidates))
    }
}

fn group_into_columns(candidates: Vec<Candidate>) -> Vec<BoardColumn> {
    let mut columns: Vec<BoardColumn> = PipelineStage::ALL
        .iter()
        .map(|stage| BoardColumn {
            stage: *stage,
            label: stage.label(),
            candidates: Vec::new(),
        })
        .collect();
    for candidate in candidates {
        let index = candidate.board_stage() as usize;
        columns[index].candidates.push(candidate);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::NewCandidate;
    use crate::models::history::HistoryFilter;
    use crate::store::{MemoryStore, MockRecruitmentStore, RecruitmentStore};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Arc;

    fn service(store: SharedStore) -> PipelineService {
        let feed = ChangeFeed::new(16);
        PipelineService::new(store.clone(), NotificationService::new(store, feed.clone()), feed)
    }

    fn move_to(stage: &str) -> MoveStagePayload {
        MoveStagePayload {
            stage: stage.to_string(),
            score: None,
            notes: None,
            rejection_reason: None,
        }
    }

    async fn candidate(store: &Arc<MemoryStore>) -> Candidate {
        store
            .insert_candidate(NewCandidate {
                full_name: "Ana Souza".into(),
                email: "ana@example.com".into(),
                tax_id: Some("52998224725".into()),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn rejection_archives_and_removes_the_active_row() {
        let store = Arc::new(MemoryStore::new());
        let c = candidate(&store).await;
        let svc = service(store.clone());
        svc.move_to_stage(c.id, move_to("triagem"), None).await.unwrap();

        let mut reject = move_to("reprovado");
        reject.rejection_reason = Some("Perfil não aderente".into());
        let outcome = svc.move_to_stage(c.id, reject, None).await.unwrap();

        let TransitionOutcome::Rejected { record, history } = outcome else {
            panic!("expected a rejection");
        };
        assert_eq!(history.final_status, FinalStatus::Rejected);
        assert_eq!(history.final_stage, Some(PipelineStage::Triagem));
        assert_eq!(history.notes.as_deref(), Some("Perfil não aderente"));
        assert_eq!(record.history_id, Some(history.id));
        assert!(store.get_candidate(c.id).await.unwrap().is_none());
        let all = store.list_history(&HistoryFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);

        let log = store.history_stage_records(history.id).await.unwrap();
        let stages: Vec<PipelineStage> = log.iter().map(|r| r.stage).collect();
        assert_eq!(stages, vec![PipelineStage::Triagem, PipelineStage::Reprovado]);
        assert_eq!(log[1].id, record.id);
    }

    #[tokio::test]
    async fn failed_rejection_leaves_no_partial_writes() {
        let seed = Arc::new(MemoryStore::new());
        let c = candidate(&seed).await;

        let mut mock = MockRecruitmentStore::new();
        let active = c.clone();
        mock.expect_get_candidate()
            .returning(move |_| Ok(Some(active.clone())));
        mock.expect_stage_records().returning(|_| Ok(Vec::new()));
        mock.expect_append_stage_record().times(0);
        mock.expect_update_candidate().times(0);
        mock.expect_archive_candidate().times(0);
        mock.expect_insert_notification().times(0);
        mock.expect_reject_candidate()
            .times(2)
            .returning(|_, _| Err(Error::Internal("connection reset".into())));
        let svc = service(Arc::new(mock));

        for _ in 0..2 {
            let mut reject = move_to("reprovado");
            reject.rejection_reason = Some("Sem disponibilidade".into());
            let err = svc.move_to_stage(c.id, reject, None).await.unwrap_err();
            assert!(matches!(err, Error::Internal(_)));
        }
    }

    #[tokio::test]
    async fn same_stage_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let c = candidate(&store).await;
        let svc = service(store.clone());
        svc.move_to_stage(c.id, move_to("entrevista_rh"), None).await.unwrap();
        let before = store.stage_records(c.id).await.unwrap().len();
        let unread = store.count_unread_notifications().await.unwrap();
        let row_before = store.get_candidate(c.id).await.unwrap().unwrap();

        let outcome = svc.move_to_stage(c.id, move_to("entrevista_rh"), None).await.unwrap();
        assert!(matches!(outcome, TransitionOutcome::Unchanged { .. }));
        assert_eq!(store.stage_records(c.id).await.unwrap().len(), before);
        assert_eq!(store.count_unread_notifications().await.unwrap(), unread);

        let row_after = store.get_candidate(c.id).await.unwrap().unwrap();
        assert_eq!(row_after.updated_at, row_before.updated_at);
        assert_eq!(row_after.status, row_before.status);
        assert_eq!(row_after.current_stage, row_before.current_stage);
    }

    #[tokio::test]
    async fn score_bounds_are_inclusive() {
        let store = Arc::new(MemoryStore::new());
        let c = candidate(&store).await;
        let svc = service(store.clone());
        for (stage, raw) in [("pre_entrevista", "0"), ("entrevista_rh", "10")] {
            let mut payload = move_to(stage);
            payload.score = Some(Decimal::from_str(raw).unwrap());
            assert!(svc.move_to_stage(c.id, payload, None).await.is_ok());
        }
        for raw in ["-0.1", "10.1"] {
            let mut payload = move_to("teste_tecnico");
            payload.score = Some(Decimal::from_str(raw).unwrap());
            let err = svc.move_to_stage(c.id, payload, None).await.unwrap_err();
            assert!(matches!(err, Error::InvalidScore(_)));
        }
        assert_eq!(store.stage_records(c.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn approval_hires_and_is_terminal() {
        let store = Arc::new(MemoryStore::new());
        let c = candidate(&store).await;
        let svc = service(store.clone());
        let outcome = svc.move_to_stage(c.id, move_to("aprovado"), None).await.unwrap();
        let TransitionOutcome::Hired { candidate, .. } = outcome else {
            panic!("expected a hire");
        };
        assert_eq!(candidate.status, CandidateStatus::Hired);
        let err = svc.move_to_stage(c.id, move_to("triagem"), None).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn board_has_every_stage() {
        let store = Arc::new(MemoryStore::new());
        let c = candidate(&store).await;
        let svc = service(store.clone());
        svc.move_to_stage(c.id, move_to("teste_tecnico"), None).await.unwrap();
        let board = svc.board().await.unwrap();
        assert_eq!(board.len(), 8);
        assert_eq!(board[3].stage, PipelineStage::TesteTecnico);
        assert_eq!(board[3].candidates.len(), 1);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_store() {
        let mut mock = MockRecruitmentStore::new();
        mock.expect_get_candidate().times(0);
        mock.expect_append_stage_record().times(0);
        let svc = service(Arc::new(mock));
        let id = Uuid::new_v4();

        let err = svc.move_to_stage(id, move_to("contratado"), None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidStage(_)));
        let err = svc.move_to_stage(id, move_to("reprovado"), None).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}
