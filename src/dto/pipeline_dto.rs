use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stage arrives as text so unknown values surface as an invalid stage
/// rather than a generic decode error.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MoveStagePayload {
    #[validate(length(min = 1))]
    pub stage: String,
    pub score: Option<Decimal>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
}
