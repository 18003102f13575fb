use serde::{Deserialize, Serialize};

/// A generated deck as listed by the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSummary {
    pub id: i64,
    pub job_id: String,
    pub company_name: String,
    pub contact_name: String,
    pub deck_url: String,
    pub pptx_url: String,
    pub gamma_id: String,
    pub created_at: String,
}
