//! In-memory job records and the single task allowed to change them.
//!
//! - `JobsState`: clonable handle shared as `web::Data`. Handlers read the map
//!   and insert new jobs; everything else is sent through `tx`.
//! - `JobUpdate`: a status change reported by a worker, the finalize step, the
//!   download handler or the janitor.
//! - `start_job_updater`: consumes `JobUpdate`s, applies them to the map and
//!   starts the finalize step once the last row of a job has finished.

use chrono::{DateTime, Utc};
use common::jobs::{JobKind, JobState, JobStatus, RowResult, RowStage, SingleJobStatus};
use common::model::prospect::ProspectRow;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

use super::finalize::{finalize_job, FinalizeRequest};

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job_id: String,
    pub kind: JobKind,
    pub state: JobState,
    pub total_rows: u32,
    pub completed: u32,
    pub failed: u32,
    pub original_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub error: Option<String>,
    pub rows: Vec<RowResult>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub downloaded_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new_batch(job_id: impl Into<String>, original_file: PathBuf, prospects: &[ProspectRow]) -> Self {
        Self::new(job_id.into(), JobKind::Batch, Some(original_file), prospects)
    }

    pub fn new_single(job_id: impl Into<String>, prospect: &ProspectRow) -> Self {
        Self::new(job_id.into(), JobKind::Single, None, std::slice::from_ref(prospect))
    }

    fn new(job_id: String, kind: JobKind, original_file: Option<PathBuf>, prospects: &[ProspectRow]) -> Self {
        Self {
            job_id,
            kind,
            state: JobState::Pending,
            total_rows: prospects.len() as u32,
            completed: 0,
            failed: 0,
            original_file,
            output_file: None,
            error: None,
            rows: prospects
                .iter()
                .map(|p| RowResult::queued(p.row_index, p.company_name.clone()))
                .collect(),
            created_at: Utc::now(),
            finished_at: None,
            downloaded_at: None,
        }
    }

    fn row_mut(&mut self, row_index: u32) -> Option<&mut RowResult> {
        self.rows.iter_mut().find(|r| r.row_index == row_index)
    }

    pub fn all_rows_finished(&self) -> bool {
        self.completed + self.failed >= self.total_rows
    }

    /// Moves a row to an in-flight stage. Terminal rows and unknown rows are left alone.
    pub fn apply_stage(&mut self, row_index: u32, stage: RowStage) {
        if stage.is_terminal() {
            return;
        }
        if let Some(row) = self.row_mut(row_index) {
            if row.status.is_terminal() {
                return;
            }
            row.status = stage;
            if self.state == JobState::Pending {
                self.state = JobState::Running;
            }
        }
    }

    /// Records a row's final outcome.
    ///
    /// Returns `true` only for the update that finished the job's last row. A
    /// row that already reached a terminal stage is never counted twice.
    pub fn apply_finished(&mut self, result: RowResult) -> bool {
        if !result.status.is_terminal() {
            return false;
        }
        let Some(row) = self.row_mut(result.row_index) else {
            return false;
        };
        if row.status.is_terminal() {
            return false;
        }

        let complete = result.status == RowStage::Complete;
        *row = result;
        if complete {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
        if self.state == JobState::Pending {
            self.state = JobState::Running;
        }
        self.all_rows_finished()
    }

    fn finish(&mut self, state: JobState, error: Option<String>) {
        self.state = state;
        self.error = error;
        self.finished_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> JobStatus {
        JobStatus {
            job_id: self.job_id.clone(),
            kind: self.kind,
            status: self.state,
            total_rows: self.total_rows,
            completed: self.completed,
            failed: self.failed,
            progress_percent: JobStatus::compute_progress(self.total_rows, self.completed, self.failed),
            output_file: self
                .output_file
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
            error: self.error.clone(),
            rows: self.rows.clone(),
        }
    }

    pub fn single_snapshot(&self) -> SingleJobStatus {
        let row = self.rows.first().cloned().unwrap_or_default();
        SingleJobStatus {
            job_id: self.job_id.clone(),
            company_name: row.company_name,
            status: self.state,
            completed: self.completed,
            failed: self.failed,
            progress_percent: row.status.progress_percent(),
            current_stage: row.status,
            deck_url: row.deck_url,
            pptx_url: row.pptx_url,
            error: row.error,
        }
    }

    fn finalize_request(&self) -> FinalizeRequest {
        FinalizeRequest {
            job_id: self.job_id.clone(),
            kind: self.kind,
            original_file: self.original_file.clone(),
            rows: self.rows.clone(),
        }
    }

    fn is_expired(&self, now: DateTime<Utc>, retention: Duration, grace: Duration) -> bool {
        let past = |at: Option<DateTime<Utc>>, after: Duration| match (at, chrono::Duration::from_std(after)) {
            (Some(at), Ok(after)) => at + after <= now,
            _ => false,
        };
        past(self.downloaded_at, grace) || (self.state.is_finished() && past(self.finished_at, retention))
    }
}

#[derive(Debug)]
pub enum JobUpdate {
    RowStage {
        job_id: String,
        row_index: u32,
        stage: RowStage,
    },
    RowFinished {
        job_id: String,
        result: RowResult,
    },
    /// The finalize step is done; batch jobs carry the written spreadsheet.
    Finalized {
        job_id: String,
        output_file: Option<PathBuf>,
    },
    JobFailed {
        job_id: String,
        error: String,
    },
    Downloaded {
        job_id: String,
    },
    /// Drop jobs past their retention or download grace period.
    Sweep,
}

/// Where finished output goes and how long jobs are kept around.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    pub output_dir: PathBuf,
    pub retention: Duration,
    pub download_grace: Duration,
}

#[derive(Clone)]
pub struct JobsState {
    pub jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    pub fn new(tx: mpsc::Sender<JobUpdate>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        }
    }

    pub async fn insert(&self, record: JobRecord) {
        info!(
            "Job {} created ({:?}, {} rows)",
            record.job_id, record.kind, record.total_rows
        );
        self.jobs.write().await.insert(record.job_id.clone(), record);
    }

    pub async fn snapshot(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).map(JobRecord::snapshot)
    }

    pub async fn single_snapshot(&self, job_id: &str) -> Option<SingleJobStatus> {
        self.jobs
            .read()
            .await
            .get(job_id)
            .filter(|r| r.kind == JobKind::Single)
            .map(JobRecord::single_snapshot)
    }

    pub async fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Drops a job whose rows could not be queued.
    pub async fn remove(&self, job_id: &str) -> Option<JobRecord> {
        let removed = self.jobs.write().await.remove(job_id);
        if removed.is_some() {
            warn!("Job {} withdrawn, its rows could not be queued", job_id);
        }
        removed
    }
}

/// Removes expired jobs from `jobs` and returns them.
pub fn evict_expired(
    jobs: &mut HashMap<String, JobRecord>,
    now: DateTime<Utc>,
    retention: Duration,
    grace: Duration,
) -> Vec<JobRecord> {
    let expired: Vec<String> = jobs
        .iter()
        .filter(|(_, record)| record.is_expired(now, retention, grace))
        .map(|(id, _)| id.clone())
        .collect();
    expired.into_iter().filter_map(|id| jobs.remove(&id)).collect()
}

fn remove_job_files(records: Vec<JobRecord>) {
    for record in records {
        for path in [record.original_file, record.output_file].into_iter().flatten() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", path.display(), e);
                }
            }
        }
    }
}

/// Applies every `JobUpdate` to the shared map until all senders are dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>, config: UpdaterConfig) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        match update {
            JobUpdate::RowStage {
                job_id,
                row_index,
                stage,
            } => {
                if let Some(record) = jobs.get_mut(&job_id) {
                    record.apply_stage(row_index, stage);
                }
            }
            JobUpdate::RowFinished { job_id, result } => {
                let Some(record) = jobs.get_mut(&job_id) else {
                    warn!("Result for unknown job {}", job_id);
                    continue;
                };
                if record.apply_finished(result) {
                    info!(
                        "Job {}: all {} rows finished ({} complete, {} failed)",
                        job_id, record.total_rows, record.completed, record.failed
                    );
                    let request = record.finalize_request();
                    tokio::spawn(finalize_job(request, config.output_dir.clone(), state.tx.clone()));
                }
            }
            JobUpdate::Finalized { job_id, output_file } => {
                if let Some(record) = jobs.get_mut(&job_id) {
                    match record.kind {
                        JobKind::Batch => {
                            record.output_file = output_file;
                            record.finish(JobState::Done, None);
                        }
                        JobKind::Single => {
                            let row = record.rows.first().cloned().unwrap_or_default();
                            if row.status == RowStage::Complete {
                                record.finish(JobState::Done, None);
                            } else {
                                record.finish(JobState::Failed, Some(row.error));
                            }
                        }
                    }
                    info!("Job {} is {:?}", job_id, record.state);
                }
            }
            JobUpdate::JobFailed { job_id, error } => {
                if let Some(record) = jobs.get_mut(&job_id) {
                    warn!("Job {} failed: {}", job_id, error);
                    record.finish(JobState::Failed, Some(error));
                }
            }
            JobUpdate::Downloaded { job_id } => {
                if let Some(record) = jobs.get_mut(&job_id) {
                    record.downloaded_at.get_or_insert_with(Utc::now);
                }
            }
            JobUpdate::Sweep => {
                let evicted = evict_expired(&mut jobs, Utc::now(), config.retention, config.download_grace);
                if !evicted.is_empty() {
                    info!("Evicted {} expired jobs", evicted.len());
                    tokio::task::spawn_blocking(move || remove_job_files(evicted));
                }
            }
        }
    }
}

/// Asks the updater to sweep expired jobs every `interval`.
pub async fn start_janitor(tx: mpsc::Sender<JobUpdate>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if tx.send(JobUpdate::Sweep).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prospect(row_index: u32, name: &str) -> ProspectRow {
        ProspectRow {
            row_index,
            company_name: name.to_string(),
            industry: String::new(),
            website_url: String::new(),
            contact_name: String::new(),
            contact_title: String::new(),
            extra_context: String::new(),
        }
    }

    fn finished(row_index: u32, status: RowStage) -> RowResult {
        RowResult {
            row_index,
            company_name: String::new(),
            status,
            ..RowResult::default()
        }
    }

    #[test]
    fn last_finished_row_completes_the_job_once() {
        let mut record = JobRecord::new_batch(
            "job1",
            PathBuf::from("in.csv"),
            &[prospect(2, "A"), prospect(3, "B")],
        );

        record.apply_stage(2, RowStage::Researching);
        assert_eq!(record.state, JobState::Running);
        assert_eq!(record.rows[0].status, RowStage::Researching);

        assert!(!record.apply_finished(finished(2, RowStage::Complete)));
        assert!(!record.apply_finished(finished(2, RowStage::Failed)));
        assert_eq!((record.completed, record.failed), (1, 0));

        assert!(record.apply_finished(finished(3, RowStage::Failed)));
        assert_eq!((record.completed, record.failed), (1, 1));
        assert!(!record.apply_finished(finished(3, RowStage::Failed)));

        record.apply_stage(3, RowStage::CreatingDeck);
        assert_eq!(record.rows[1].status, RowStage::Failed);

        let snapshot = record.snapshot();
        assert_eq!(snapshot.progress_percent, 100);
        assert_eq!(snapshot.status, JobState::Running);
    }

    #[test]
    fn unknown_rows_are_ignored() {
        let mut record = JobRecord::new_batch("job1", PathBuf::from("in.csv"), &[prospect(2, "A")]);
        assert!(!record.apply_finished(finished(9, RowStage::Complete)));
        assert_eq!(record.completed, 0);
    }

    #[test]
    fn single_snapshot_reports_stage_progress() {
        let mut record = JobRecord::new_single("s1", &prospect(0, "Acme"));
        record.apply_stage(0, RowStage::GeneratingContent);
        let snapshot = record.single_snapshot();
        assert_eq!(snapshot.company_name, "Acme");
        assert_eq!(snapshot.current_stage, RowStage::GeneratingContent);
        assert_eq!(snapshot.progress_percent, 50);
    }

    #[test]
    fn eviction_honours_grace_and_retention() {
        let now = Utc::now();
        let mut jobs = HashMap::new();

        let mut downloaded = JobRecord::new_batch("dl", PathBuf::from("a.csv"), &[prospect(2, "A")]);
        downloaded.state = JobState::Done;
        downloaded.finished_at = Some(now);
        downloaded.downloaded_at = Some(now - chrono::Duration::seconds(700));

        let mut old = JobRecord::new_batch("old", PathBuf::from("b.csv"), &[prospect(2, "B")]);
        old.state = JobState::Failed;
        old.finished_at = Some(now - chrono::Duration::hours(25));

        let mut running = JobRecord::new_batch("run", PathBuf::from("c.csv"), &[prospect(2, "C")]);
        running.created_at = now - chrono::Duration::hours(48);

        let mut fresh = JobRecord::new_batch("fresh", PathBuf::from("d.csv"), &[prospect(2, "D")]);
        fresh.state = JobState::Done;
        fresh.finished_at = Some(now);

        for record in [downloaded, old, running, fresh] {
            jobs.insert(record.job_id.clone(), record);
        }

        let mut evicted: Vec<String> = evict_expired(
            &mut jobs,
            now,
            Duration::from_secs(86_400),
            Duration::from_secs(600),
        )
        .into_iter()
        .map(|r| r.job_id)
        .collect();
        evicted.sort();

        assert_eq!(evicted, vec!["dl", "old"]);
        assert!(jobs.contains_key("run"));
        assert!(jobs.contains_key("fresh"));
    }

    #[tokio::test]
    async fn updater_settles_a_single_job_from_its_row() {
        let (tx, rx) = mpsc::channel(16);
        let state = JobsState::new(tx.clone());
        state.insert(JobRecord::new_single("s1", &prospect(0, "Acme"))).await;

        let config = UpdaterConfig {
            output_dir: std::env::temp_dir(),
            retention: Duration::from_secs(60),
            download_grace: Duration::from_secs(60),
        };
        let updater = tokio::spawn(start_job_updater(state.clone(), rx, config));

        tx.send(JobUpdate::RowFinished {
            job_id: "s1".to_string(),
            result: RowResult {
                row_index: 0,
                company_name: "Acme".to_string(),
                status: RowStage::Failed,
                error: "research API returned 500".to_string(),
                ..RowResult::default()
            },
        })
        .await
        .unwrap();

        let mut status = None;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let snapshot = state.single_snapshot("s1").await.unwrap();
            if snapshot.status.is_finished() {
                status = Some(snapshot);
                break;
            }
        }

        let status = status.expect("single job never settled");
        assert_eq!(status.status, JobState::Failed);
        assert_eq!(status.error, "research API returned 500");
        assert_eq!(status.progress_percent, 100);

        drop(tx);
        drop(state);
        updater.abort();
    }
}
