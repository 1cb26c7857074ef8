use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::history::{FinalStatus, HistoryFilter, HistoryLookup, HistoryRecord};
use crate::models::stage::StageRecord;
use crate::store::SharedStore;

/// Previous applications matching a person, with the derived flags the
/// intake form shows before an insert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub matches: Vec<HistoryRecord>,
    pub has_been_rejected: bool,
    pub has_talent_pool: bool,
    pub has_withdrawn: bool,
}

impl DuplicateReport {
    pub fn from_matches(matches: Vec<HistoryRecord>) -> Self {
        let has = |status: FinalStatus| matches.iter().any(|r| r.final_status == status);
        let has_been_rejected = has(FinalStatus::Rejected);
        let has_talent_pool = has(FinalStatus::TalentPool);
        let has_withdrawn = has(FinalStatus::Withdrawn);
        Self {
            matches,
            has_been_rejected,
            has_talent_pool,
            has_withdrawn,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[derive(Clone)]
pub struct HistoryService {
    store: SharedStore,
}

impl HistoryService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Matches by CPF, phone (9+ digits, substring) or partial name. Missing
    /// inputs give an empty report.
    pub async fn check_duplicates(
        &self,
        name: Option<&str>,
        phone: Option<&str>,
        tax_id: Option<&str>,
    ) -> Result<DuplicateReport> {
        let lookup = HistoryLookup::new(name, phone, tax_id);
        if lookup.is_empty() {
            return Ok(DuplicateReport::default());
        }
        let matches = self.store.lookup_history(&lookup).await?;
        tracing::debug!(matches = matches.len(), "history lookup");
        Ok(DuplicateReport::from_matches(matches))
    }

    pub async fn list(&self, filter: HistoryFilter) -> Result<Vec<HistoryRecord>> {
        self.store.list_history(&filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<HistoryRecord> {
        self.store
            .get_history(id)
            .await?
            .ok_or_else(|| Error::NotFound("History record not found".to_string()))
    }

    /// Stage log the application carried when it was archived, newest first.
    pub async fn stage_log(&self, id: Uuid) -> Result<Vec<StageRecord>> {
        self.get(id).await?;
        let mut records = self.store.history_stage_records(id).await?;
        records.reverse();
        Ok(records)
    }
}
