pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    analytics_service::AnalyticsService,
    auth_service::{AuthService, SessionRegistry},
    candidate_service::CandidateService,
    change_feed::ChangeFeed,
    export_service::ExportService,
    history_service::HistoryService,
    job_service::JobService,
    notification_service::NotificationService,
    pipeline_service::PipelineService,
    resume_service::ResumeService,
    talent_pool_service::TalentPoolService,
};
use crate::store::SharedStore;

const CHANGE_FEED_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub feed: ChangeFeed,
    pub auth_service: AuthService,
    pub candidate_service: CandidateService,
    pub pipeline_service: PipelineService,
    pub talent_pool_service: TalentPoolService,
    pub history_service: HistoryService,
    pub job_service: JobService,
    pub notification_service: NotificationService,
    pub analytics_service: AnalyticsService,
    pub export_service: ExportService,
}

impl AppState {
    pub fn new(config: Config, store: SharedStore) -> Self {
        let feed = ChangeFeed::new(CHANGE_FEED_CAPACITY);

        let notification_service = NotificationService::new(store.clone(), feed.clone());
        let history_service = HistoryService::new(store.clone());
        let resume_service = ResumeService::new(config.uploads_dir.clone());
        let auth_service = AuthService::new(
            store.clone(),
            SessionRegistry::new(),
            &config.jwt_secret,
            config.jwt_ttl_hours,
        );
        let candidate_service = CandidateService::new(
            store.clone(),
            history_service.clone(),
            notification_service.clone(),
            resume_service,
            feed.clone(),
        );
        let pipeline_service =
            PipelineService::new(store.clone(), notification_service.clone(), feed.clone());
        let talent_pool_service =
            TalentPoolService::new(store.clone(), notification_service.clone(), feed.clone());
        let job_service = JobService::new(store.clone(), feed.clone());
        let analytics_service = AnalyticsService::new(store.clone());
        let export_service = ExportService::new(store.clone());

        Self {
            config: Arc::new(config),
            feed,
            auth_service,
            candidate_service,
            pipeline_service,
            talent_pool_service,
            history_service,
            job_service,
            notification_service,
            analytics_service,
            export_service,
        }
    }
}
