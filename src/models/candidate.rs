use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::stage::PipelineStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    New,
    InProcess,
    Hired,
    Dismissed,
}

impl CandidateStatus {
    pub const ALL: [CandidateStatus; 4] = [
        CandidateStatus::New,
        CandidateStatus::InProcess,
        CandidateStatus::Hired,
        CandidateStatus::Dismissed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::New => "new",
            CandidateStatus::InProcess => "in_process",
            CandidateStatus::Hired => "hired",
            CandidateStatus::Dismissed => "dismissed",
        }
    }

    /// Overall status implied by entering `stage`.
    pub fn for_stage(stage: PipelineStage) -> Self {
        match stage {
            PipelineStage::Aprovado => CandidateStatus::Hired,
            PipelineStage::Reprovado => CandidateStatus::Dismissed,
            _ => CandidateStatus::InProcess,
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandidateStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown candidate status: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Bare CPF digits.
    pub tax_id: Option<String>,
    pub desired_role: Option<String>,
    pub message: Option<String>,
    pub resume_url: Option<String>,
    pub job_id: Option<Uuid>,
    pub current_stage: Option<PipelineStage>,
    pub status: CandidateStatus,
    pub talent_pool: bool,
    pub sector_of_interest: Option<String>,
    pub talent_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    /// Column on the board. Candidates that were never staged sit in triagem.
    pub fn board_stage(&self) -> PipelineStage {
        self.current_stage.unwrap_or(PipelineStage::Triagem)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewCandidate {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub desired_role: Option<String>,
    pub message: Option<String>,
    pub resume_url: Option<String>,
    pub job_id: Option<Uuid>,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct CandidateChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub desired_role: Option<String>,
    pub message: Option<String>,
    pub resume_url: Option<String>,
    pub job_id: Option<Uuid>,
    pub current_stage: Option<PipelineStage>,
    pub status: Option<CandidateStatus>,
    pub talent_pool: Option<bool>,
    pub sector_of_interest: Option<String>,
    pub talent_notes: Option<String>,
}

impl CandidateChanges {
    pub fn apply(&self, candidate: &mut Candidate, at: DateTime<Utc>) {
        if let Some(v) = &self.full_name {
            candidate.full_name = v.clone();
        }
        if let Some(v) = &self.email {
            candidate.email = v.clone();
        }
        if let Some(v) = &self.phone {
            candidate.phone = Some(v.clone());
        }
        if let Some(v) = &self.tax_id {
            candidate.tax_id = Some(v.clone());
        }
        if let Some(v) = &self.desired_role {
            candidate.desired_role = Some(v.clone());
        }
        if let Some(v) = &self.message {
            candidate.message = Some(v.clone());
        }
        if let Some(v) = &self.resume_url {
            candidate.resume_url = Some(v.clone());
        }
        if let Some(v) = self.job_id {
            candidate.job_id = Some(v);
        }
        if let Some(v) = self.current_stage {
            candidate.current_stage = Some(v);
        }
        if let Some(v) = self.status {
            candidate.status = v;
        }
        if let Some(v) = self.talent_pool {
            candidate.talent_pool = v;
        }
        if let Some(v) = &self.sector_of_interest {
            candidate.sector_of_interest = Some(v.clone());
        }
        if let Some(v) = &self.talent_notes {
            candidate.talent_notes = Some(v.clone());
        }
        candidate.updated_at = at;
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub status: Option<CandidateStatus>,
    pub talent_pool: Option<bool>,
    pub sector: Option<String>,
    pub search: Option<String>,
}

impl CandidateFilter {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        if let Some(status) = self.status {
            if candidate.status != status {
                return false;
            }
        }
        if let Some(flag) = self.talent_pool {
            if candidate.talent_pool != flag {
                return false;
            }
        }
        if let Some(sector) = &self.sector {
            let same = candidate
                .sector_of_interest
                .as_deref()
                .map(|s| s.eq_ignore_ascii_case(sector))
                .unwrap_or(false);
            if !same {
                return false;
            }
        }
        if let Some(search) = &self.search {
            use crate::utils::text::contains_ignore_case;
            let hit = contains_ignore_case(&candidate.full_name, search)
                || contains_ignore_case(&candidate.email, search)
                || candidate
                    .desired_role
                    .as_deref()
                    .map(|r| contains_ignore_case(r, search))
                    .unwrap_or(false);
            if !hit {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_stage() {
        assert_eq!(CandidateStatus::for_stage(PipelineStage::Triagem), CandidateStatus::InProcess);
        assert_eq!(CandidateStatus::for_stage(PipelineStage::Aprovado), CandidateStatus::Hired);
        assert_eq!(
            CandidateStatus::for_stage(PipelineStage::Reprovado),
            CandidateStatus::Dismissed
        );
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in CandidateStatus::ALL {
            assert_eq!(status.as_str().parse::<CandidateStatus>().unwrap(), status);
        }
        assert!("archived".parse::<CandidateStatus>().is_err());
    }
}
