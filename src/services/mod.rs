pub mod analytics_service;
pub mod auth_service;
pub mod candidate_service;
pub mod change_feed;
pub mod export_service;
pub mod history_service;
pub mod job_service;
pub mod notification_service;
pub mod pipeline_service;
pub mod resume_service;
pub mod talent_pool_service;
