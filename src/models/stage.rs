use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The fixed hiring pipeline. Declaration order is board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Triagem,
    PreEntrevista,
    EntrevistaRh,
    TesteTecnico,
    TesteComportamental,
    EntrevistaFinal,
    Aprovado,
    Reprovado,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 8] = [
        PipelineStage::Triagem,
        PipelineStage::PreEntrevista,
        PipelineStage::EntrevistaRh,
        PipelineStage::TesteTecnico,
        PipelineStage::TesteComportamental,
        PipelineStage::EntrevistaFinal,
        PipelineStage::Aprovado,
        PipelineStage::Reprovado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Triagem => "triagem",
            PipelineStage::PreEntrevista => "pre_entrevista",
            PipelineStage::EntrevistaRh => "entrevista_rh",
            PipelineStage::TesteTecnico => "teste_tecnico",
            PipelineStage::TesteComportamental => "teste_comportamental",
            PipelineStage::EntrevistaFinal => "entrevista_final",
            PipelineStage::Aprovado => "aprovado",
            PipelineStage::Reprovado => "reprovado",
        }
    }

    /// Column title on the board.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Triagem => "Triagem",
            PipelineStage::PreEntrevista => "Pré-entrevista",
            PipelineStage::EntrevistaRh => "Entrevista RH",
            PipelineStage::TesteTecnico => "Teste técnico",
            PipelineStage::TesteComportamental => "Teste comportamental",
            PipelineStage::EntrevistaFinal => "Entrevista final",
            PipelineStage::Aprovado => "Aprovado",
            PipelineStage::Reprovado => "Reprovado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Aprovado | PipelineStage::Reprovado)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pipeline stage: {0}")]
pub struct UnknownStage(pub String);

impl FromStr for PipelineStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineStage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s.trim())
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

pub const STAGE_STATUS_IN_PROGRESS: &str = "in_progress";

/// One entry of the append-only stage log. The log outlives the active
/// row: archiving points it at the history record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub history_id: Option<Uuid>,
    pub stage: PipelineStage,
    pub status: String,
    pub score: Option<Decimal>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStageRecord {
    pub candidate_id: Uuid,
    pub stage: PipelineStage,
    pub score: Option<Decimal>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_by: Option<Uuid>,
}

/// The current stage is the most recent log entry. On equal timestamps the
/// later entry in the slice wins.
pub fn project_current_stage(records: &[StageRecord]) -> Option<PipelineStage> {
    records
        .iter()
        .max_by_key(|r| r.created_at)
        .map(|r| r.stage)
}

/// Scores live in [0, 10], both ends inclusive.
pub fn score_in_range(score: Decimal) -> bool {
    score >= Decimal::ZERO && score <= Decimal::TEN
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(stage: PipelineStage, at: DateTime<Utc>) -> StageRecord {
        StageRecord {
            id: Uuid::new_v4(),
            candidate_id: Uuid::nil(),
            history_id: None,
            stage,
            status: STAGE_STATUS_IN_PROGRESS.to_string(),
            score: None,
            notes: None,
            rejection_reason: None,
            created_by: None,
            created_at: at,
        }
    }

    #[test]
    fn parses_every_known_stage() {
        for stage in PipelineStage::ALL {
            assert_eq!(stage.as_str().parse::<PipelineStage>().unwrap(), stage);
        }
    }

    #[test]
    fn rejects_unknown_stage() {
        assert!("contratado".parse::<PipelineStage>().is_err());
        assert!("".parse::<PipelineStage>().is_err());
        assert!("TRIAGEM".parse::<PipelineStage>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&PipelineStage::EntrevistaRh).unwrap();
        assert_eq!(json, "\"entrevista_rh\"");
        assert!(serde_json::from_str::<PipelineStage>("\"nope\"").is_err());
    }

    #[test]
    fn only_outcomes_are_terminal() {
        let terminal: Vec<_> = PipelineStage::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![&PipelineStage::Aprovado, &PipelineStage::Reprovado]);
    }

    #[test]
    fn projection_picks_latest_record() {
        let t0 = Utc::now();
        let records = vec![
            record(PipelineStage::EntrevistaRh, t0 + Duration::seconds(10)),
            record(PipelineStage::Triagem, t0),
            record(PipelineStage::PreEntrevista, t0 + Duration::seconds(5)),
        ];
        assert_eq!(project_current_stage(&records), Some(PipelineStage::EntrevistaRh));
        assert_eq!(project_current_stage(&[]), None);
    }

    #[test]
    fn projection_breaks_ties_by_log_order() {
        let t0 = Utc::now();
        let records = vec![
            record(PipelineStage::Triagem, t0),
            record(PipelineStage::PreEntrevista, t0),
        ];
        assert_eq!(project_current_stage(&records), Some(PipelineStage::PreEntrevista));
    }

    #[test]
    fn score_bounds_are_inclusive() {
        assert!(score_in_range(Decimal::ZERO));
        assert!(score_in_range(Decimal::TEN));
        assert!(score_in_range(Decimal::new(75, 1)));
        assert!(!score_in_range(Decimal::new(-1, 1)));
        assert!(!score_in_range(Decimal::new(101, 1)));
    }
}
