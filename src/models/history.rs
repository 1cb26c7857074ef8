use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::stage::PipelineStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Rejected,
    TalentPool,
    Withdrawn,
    Approved,
}

impl FinalStatus {
    pub const ALL: [FinalStatus; 4] = [
        FinalStatus::Rejected,
        FinalStatus::TalentPool,
        FinalStatus::Withdrawn,
        FinalStatus::Approved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FinalStatus::Rejected => "rejected",
            FinalStatus::TalentPool => "talent_pool",
            FinalStatus::Withdrawn => "withdrawn",
            FinalStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FinalStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown final status: {}", s))
    }
}

/// Archived outcome of an application. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub desired_role: Option<String>,
    pub job_id: Option<Uuid>,
    pub final_status: FinalStatus,
    pub final_stage: Option<PipelineStage>,
    pub score: Option<Decimal>,
    pub notes: Option<String>,
    pub application_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHistoryRecord {
    pub full_name: String,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub desired_role: Option<String>,
    pub job_id: Option<Uuid>,
    pub final_status: FinalStatus,
    pub final_stage: Option<PipelineStage>,
    pub score: Option<Decimal>,
    pub notes: Option<String>,
    pub application_date: DateTime<Utc>,
}

impl NewHistoryRecord {
    pub fn from_candidate(
        candidate: &super::candidate::Candidate,
        final_status: FinalStatus,
        final_stage: Option<PipelineStage>,
        score: Option<Decimal>,
        notes: Option<String>,
    ) -> Self {
        Self {
            full_name: candidate.full_name.clone(),
            phone: candidate.phone.clone(),
            tax_id: candidate.tax_id.clone(),
            email: Some(candidate.email.clone()),
            desired_role: candidate.desired_role.clone(),
            job_id: candidate.job_id,
            final_status,
            final_stage,
            score,
            notes,
            application_date: candidate.created_at,
        }
    }
}

/// Normalised duplicate-check criteria. Records match when ANY present
/// criterion matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLookup {
    /// Exact digits-only CPF.
    pub tax_id: Option<String>,
    /// Phone digits, substring match. Only kept with at least 9 digits.
    pub phone: Option<String>,
    /// Case-insensitive partial name.
    pub name: Option<String>,
}

pub const MIN_PHONE_DIGITS: usize = 9;

impl HistoryLookup {
    pub fn new(name: Option<&str>, phone: Option<&str>, tax_id: Option<&str>) -> Self {
        use crate::utils::cpf::digits_only;

        let tax_id = tax_id.map(digits_only).filter(|d| !d.is_empty());
        let phone = phone
            .map(digits_only)
            .filter(|d| d.len() >= MIN_PHONE_DIGITS);
        let name = name
            .map(|n| n.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|n| !n.is_empty());
        Self { tax_id, phone, name }
    }

    pub fn is_empty(&self) -> bool {
        self.tax_id.is_none() && self.phone.is_none() && self.name.is_none()
    }

    pub fn matches(&self, record: &HistoryRecord) -> bool {
        use crate::utils::cpf::digits_only;
        use crate::utils::text::contains_ignore_case;

        let by_tax_id = match (&self.tax_id, &record.tax_id) {
            (Some(wanted), Some(stored)) => digits_only(stored) == *wanted,
            _ => false,
        };
        let by_phone = match (&self.phone, &record.phone) {
            (Some(wanted), Some(stored)) => digits_only(stored).contains(wanted.as_str()),
            _ => false,
        };
        let by_name = match &self.name {
            Some(wanted) => contains_ignore_case(&record.full_name, wanted),
            None => false,
        };
        by_tax_id || by_phone || by_name
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub final_status: Option<FinalStatus>,
    pub search: Option<String>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &HistoryRecord) -> bool {
        if let Some(status) = self.final_status {
            if record.final_status != status {
                return false;
            }
        }
        match &self.search {
            Some(search) => crate::utils::text::contains_ignore_case(&record.full_name, search),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, phone: Option<&str>, tax_id: Option<&str>) -> HistoryRecord {
        HistoryRecord {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            phone: phone.map(str::to_string),
            tax_id: tax_id.map(str::to_string),
            email: None,
            desired_role: None,
            job_id: None,
            final_status: FinalStatus::Rejected,
            final_stage: None,
            score: None,
            notes: None,
            application_date: Utc::now(),
        }
    }

    #[test]
    fn lookup_normalises_inputs() {
        let lookup = HistoryLookup::new(
            Some("  Ana   Souza "),
            Some("(11) 98765-4321"),
            Some("529.982.247-25"),
        );
        assert_eq!(lookup.name.as_deref(), Some("Ana Souza"));
        assert_eq!(lookup.phone.as_deref(), Some("11987654321"));
        assert_eq!(lookup.tax_id.as_deref(), Some("52998224725"));
    }

    #[test]
    fn short_phone_and_blank_inputs_are_ignored() {
        let lookup = HistoryLookup::new(Some("   "), Some("9876-543"), Some("--"));
        assert!(lookup.is_empty());
    }

    #[test]
    fn matches_on_tax_id_exactly() {
        let lookup = HistoryLookup::new(None, None, Some("52998224725"));
        assert!(lookup.matches(&record("X", None, Some("52998224725"))));
        assert!(lookup.matches(&record("X", None, Some("529.982.247-25"))));
        assert!(!lookup.matches(&record("X", None, Some("11144477735"))));
    }

    #[test]
    fn matches_phone_as_substring_of_stored_digits() {
        let lookup = HistoryLookup::new(None, Some("98765-4321"), None);
        assert!(lookup.matches(&record("X", Some("+55 (11) 98765-4321"), None)));
        assert!(!lookup.matches(&record("X", Some("+55 (11) 91234-5678"), None)));
    }

    #[test]
    fn matches_name_case_insensitively() {
        let lookup = HistoryLookup::new(Some("joão"), None, None);
        assert!(lookup.matches(&record("João Pedro Lima", None, None)));
        assert!(!lookup.matches(&record("Maria Lima", None, None)));
    }
}
