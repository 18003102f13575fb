//! Status types for background jobs, as reported by the status endpoints.
//!
//! A job is one upload (or one single-prospect submission). Each of its rows
//! walks through the `RowStage` sequence independently; the job-level
//! `JobState` only settles once every row has reached a terminal stage and the
//! output spreadsheet has been written.

use serde::{Deserialize, Serialize};

/// Where a single row currently is inside the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStage {
    #[default]
    Queued,
    Researching,
    GeneratingContent,
    CreatingDeck,
    Complete,
    Failed,
}

impl RowStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, RowStage::Complete | RowStage::Failed)
    }

    /// Coarse progress shown for a single-prospect job.
    pub fn progress_percent(self) -> u8 {
        match self {
            RowStage::Queued => 0,
            RowStage::Researching => 25,
            RowStage::GeneratingContent => 50,
            RowStage::CreatingDeck => 75,
            RowStage::Complete | RowStage::Failed => 100,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RowStage::Queued => "queued",
            RowStage::Researching => "researching",
            RowStage::GeneratingContent => "generating_content",
            RowStage::CreatingDeck => "creating_deck",
            RowStage::Complete => "complete",
            RowStage::Failed => "failed",
        }
    }
}

/// Outcome of one row, written back into the output spreadsheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowResult {
    pub row_index: u32,
    pub company_name: String,
    pub status: RowStage,
    #[serde(default)]
    pub deck_url: String,
    #[serde(default)]
    pub pptx_url: String,
    #[serde(default)]
    pub pdf_url: String,
    #[serde(default)]
    pub error: String,
}

impl RowResult {
    pub fn queued(row_index: u32, company_name: impl Into<String>) -> Self {
        Self {
            row_index,
            company_name: company_name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Batch,
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Done,
    Failed,
}

impl JobState {
    pub fn is_finished(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

/// Snapshot of a job returned by `GET /api/status/{job_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub kind: JobKind,
    pub status: JobState,
    pub total_rows: u32,
    pub completed: u32,
    pub failed: u32,
    pub progress_percent: u8,
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub rows: Vec<RowResult>,
}

impl JobStatus {
    /// Share of rows that reached a terminal stage, rounded to the nearest percent.
    pub fn compute_progress(total_rows: u32, completed: u32, failed: u32) -> u8 {
        if total_rows == 0 {
            return 0;
        }
        let done = (completed + failed).min(total_rows) as f64;
        (done / total_rows as f64 * 100.0).round() as u8
    }
}

/// Snapshot of a single-prospect job returned by `GET /api/single/status/{job_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleJobStatus {
    pub job_id: String,
    pub company_name: String,
    pub status: JobState,
    pub completed: u32,
    pub failed: u32,
    pub progress_percent: u8,
    pub current_stage: RowStage,
    #[serde(default)]
    pub deck_url: String,
    #[serde(default)]
    pub pptx_url: String,
    #[serde(default)]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_rounds_and_ignores_empty_jobs() {
        assert_eq!(JobStatus::compute_progress(0, 0, 0), 0);
        assert_eq!(JobStatus::compute_progress(3, 1, 0), 33);
        assert_eq!(JobStatus::compute_progress(3, 1, 1), 67);
        assert_eq!(JobStatus::compute_progress(2, 2, 0), 100);
    }

    #[test]
    fn stages_serialize_in_snake_case() {
        let json = serde_json::to_string(&RowStage::GeneratingContent).unwrap();
        assert_eq!(json, "\"generating_content\"");
        assert_eq!(RowStage::GeneratingContent.as_str(), "generating_content");
        assert!(RowStage::Failed.is_terminal());
        assert!(!RowStage::CreatingDeck.is_terminal());
        assert_eq!(RowStage::CreatingDeck.progress_percent(), 75);
    }
}
