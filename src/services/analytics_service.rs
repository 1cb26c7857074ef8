use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::candidate::{Candidate, CandidateFilter, CandidateStatus};
use crate::models::history::{FinalStatus, HistoryFilter, HistoryRecord};
use crate::models::job::JobFilter;
use crate::models::stage::PipelineStage;
use crate::services::candidate_service::project_stages;
use crate::store::SharedStore;
use crate::utils::time::now;

const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
pub struct StageCount {
    pub stage: PipelineStage,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_candidates: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub by_stage: Vec<StageCount>,
    pub talent_pool: usize,
    pub history_by_outcome: BTreeMap<&'static str, usize>,
    pub applications_last_7_days: usize,
    pub active_jobs: i64,
}

/// Dashboard figures from a snapshot of the store. Every status, stage and
/// outcome is present, with zero when nothing matches.
pub fn summarize(
    candidates: &[Candidate],
    history: &[HistoryRecord],
    active_jobs: i64,
    at: DateTime<Utc>,
) -> DashboardStats {
    let mut by_status: BTreeMap<&'static str, usize> =
        CandidateStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    let mut stage_counts = vec![0usize; PipelineStage::ALL.len()];
    for candidate in candidates {
        *by_status.entry(candidate.status.as_str()).or_default() += 1;
        stage_counts[candidate.board_stage() as usize] += 1;
    }
    let by_stage = PipelineStage::ALL
        .iter()
        .zip(stage_counts)
        .map(|(stage, count)| StageCount {
            stage: *stage,
            label: stage.label(),
            count,
        })
        .collect();

    let mut history_by_outcome: BTreeMap<&'static str, usize> =
        FinalStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for record in history {
        *history_by_outcome
            .entry(record.final_status.as_str())
            .or_default() += 1;
    }

    let since = at - Duration::days(RECENT_WINDOW_DAYS);
    let applications_last_7_days = candidates.iter().filter(|c| c.created_at >= since).count()
        + history
            .iter()
            .filter(|r| r.application_date >= since)
            .count();

    DashboardStats {
        total_candidates: candidates.len(),
        by_status,
        by_stage,
        talent_pool: candidates.iter().filter(|c| c.talent_pool).count(),
        history_by_outcome,
        applications_last_7_days,
        active_jobs,
    }
}

#[derive(Clone)]
pub struct AnalyticsService {
    store: SharedStore,
}

impl AnalyticsService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn dashboard(&self) -> Result<DashboardStats> {
        let candidates = self.store.list_candidates(&CandidateFilter::default()).await?;
        let candidates = project_stages(&self.store, candidates).await?;
        let history = self.store.list_history(&HistoryFilter::default()).await?;
        let active = JobFilter {
            active: Some(true),
            search: None,
        };
        let (_, active_jobs) = self.store.list_jobs(&active, 1, 0).await?;
        Ok(summarize(&candidates, &history, active_jobs, now()))
    }
}
