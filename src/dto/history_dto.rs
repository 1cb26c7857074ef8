use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HistoryListQuery {
    pub final_status: Option<String>,
    pub search: Option<String>,
}
