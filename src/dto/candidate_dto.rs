use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::candidate::Candidate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCandidatePayload {
    #[validate(length(min = 2, max = 200))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    /// Masked or bare CPF.
    pub tax_id: Option<String>,
    #[validate(length(max = 200))]
    pub desired_role: Option<String>,
    pub message: Option<String>,
    pub job_id: Option<Uuid>,
    /// Insert even when previous applications are on record.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCandidatePayload {
    #[validate(length(min = 2, max = 200))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    #[validate(length(max = 200))]
    pub desired_role: Option<String>,
    pub message: Option<String>,
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CandidateListQuery {
    pub status: Option<String>,
    pub talent_pool: Option<bool>,
    pub sector: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DuplicateCheckQuery {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateListResponse {
    pub items: Vec<Candidate>,
    pub total: usize,
}

impl From<Vec<Candidate>> for CandidateListResponse {
    fn from(items: Vec<Candidate>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}
