use serde::{Deserialize, Serialize};

/// Form payload for generating a deck for one prospect without a spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingleProspect {
    pub client_name: String,
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub linkedin_url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub notes: String,
}
