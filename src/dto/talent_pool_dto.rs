use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FlagTalentPayload {
    #[validate(length(min = 1, max = 120))]
    pub sector_of_interest: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalResponsePayload {
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ArchiveCandidatePayload {
    #[validate(length(min = 1))]
    pub final_status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TalentPoolQuery {
    pub sector: Option<String>,
}
