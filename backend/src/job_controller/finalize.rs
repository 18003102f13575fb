use common::jobs::{JobKind, RowResult};
use log::{error, info};
use std::path::PathBuf;
use tokio::sync::mpsc;

use super::state::JobUpdate;
use crate::spreadsheet::write_results;

/// What the finalize step needs to know about a job whose rows are all finished.
#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    pub job_id: String,
    pub kind: JobKind,
    pub original_file: Option<PathBuf>,
    pub rows: Vec<RowResult>,
}

/// Writes the output spreadsheet for a batch job and reports back to the updater.
///
/// Single-prospect jobs have no spreadsheet and are settled straight away.
pub async fn finalize_job(request: FinalizeRequest, output_dir: PathBuf, tx: mpsc::Sender<JobUpdate>) {
    let FinalizeRequest {
        job_id,
        kind,
        original_file,
        rows,
    } = request;

    let update = match (kind, original_file) {
        (JobKind::Single, _) => JobUpdate::Finalized {
            job_id,
            output_file: None,
        },
        (JobKind::Batch, None) => JobUpdate::JobFailed {
            job_id,
            error: "original upload is missing".to_string(),
        },
        (JobKind::Batch, Some(original)) => {
            let written =
                tokio::task::spawn_blocking(move || write_results(&original, &rows, &output_dir)).await;
            match written {
                Ok(Ok(path)) => {
                    info!("Job {}: wrote {}", job_id, path.display());
                    JobUpdate::Finalized {
                        job_id,
                        output_file: Some(path),
                    }
                }
                Ok(Err(e)) => {
                    error!("Job {}: could not write output: {}", job_id, e);
                    JobUpdate::JobFailed {
                        job_id,
                        error: format!("failed to write output spreadsheet: {}", e),
                    }
                }
                Err(join_err) => JobUpdate::JobFailed {
                    job_id,
                    error: format!("join error: {}", join_err),
                },
            }
        }
    };

    let _ = tx.send(update).await;
}
