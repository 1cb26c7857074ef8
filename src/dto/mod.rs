pub mod auth_dto;
pub mod candidate_dto;
pub mod history_dto;
pub mod job_dto;
pub mod notification_dto;
pub mod pipeline_dto;
pub mod public_dto;
pub mod talent_pool_dto;
