use crate::jobs::JobState;
use crate::model::history::DeckSummary;
use serde::{Deserialize, Serialize};

/// Returned by `POST /api/upload` once every row has been queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub job_id: String,
    pub total_rows: u32,
    pub status: JobState,
    pub message: String,
}

/// Returned by `POST /api/single`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleJobAccepted {
    pub job_id: String,
    pub company_name: String,
    pub status: JobState,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
    pub decks: Vec<DeckSummary>,
}

/// One presentation theme offered by the deck API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Returned by `GET /api/themes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeList {
    pub themes: Vec<Theme>,
    pub count: usize,
}

impl ThemeList {
    pub fn new(themes: Vec<Theme>) -> Self {
        let count = themes.len();
        Self { themes, count }
    }
}
