use common::jobs::{RowResult, RowStage};
use common::model::prospect::ProspectRow;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::state::JobUpdate;
use crate::pipeline::runner::Pipeline;

/// One row waiting for a worker.
#[derive(Debug, Clone)]
pub struct RowTask {
    pub job_id: String,
    pub prospect: ProspectRow,
}

/// Unbounded FIFO of rows; pushing never waits on the workers.
#[derive(Clone)]
pub struct WorkQueue {
    tx: mpsc::UnboundedSender<RowTask>,
}

impl WorkQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RowTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn push(&self, task: RowTask) -> Result<(), String> {
        self.tx
            .send(task)
            .map_err(|_| "work queue is closed".to_string())
    }
}

/// Runs one row in its own task so a panic fails that row instead of the worker.
async fn run_isolated(pipeline: &Arc<Pipeline>, task: RowTask, updates: &mpsc::Sender<JobUpdate>) {
    let job_id = task.job_id.clone();
    let row_index = task.prospect.row_index;
    let company_name = task.prospect.company_name.clone();

    let pipeline = pipeline.clone();
    let row_updates = updates.clone();
    let handle = tokio::spawn(async move {
        pipeline.process(&task, &row_updates).await;
    });

    if let Err(e) = handle.await {
        error!("Job {}: row {} aborted: {}", job_id, row_index, e);
        let result = RowResult {
            row_index,
            company_name,
            status: RowStage::Failed,
            error: format!("row processing aborted: {}", e),
            ..RowResult::default()
        };
        let _ = updates.send(JobUpdate::RowFinished { job_id, result }).await;
    }
}

/// Spawns `count` workers (at least one) that share `rx` and run each row through `pipeline`.
pub fn start_workers(
    count: usize,
    rx: mpsc::UnboundedReceiver<RowTask>,
    pipeline: Arc<Pipeline>,
    updates: mpsc::Sender<JobUpdate>,
) -> Vec<JoinHandle<()>> {
    let rx = Arc::new(Mutex::new(rx));
    (0..count.max(1))
        .map(|worker| {
            let rx = rx.clone();
            let pipeline = pipeline.clone();
            let updates = updates.clone();
            tokio::spawn(async move {
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(task) = next else {
                        break;
                    };
                    run_isolated(&pipeline, task, &updates).await;
                }
                info!("Worker {} stopped", worker);
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(row_index: u32) -> RowTask {
        RowTask {
            job_id: "job1".to_string(),
            prospect: ProspectRow {
                row_index,
                company_name: format!("Company {}", row_index),
                industry: String::new(),
                website_url: String::new(),
                contact_name: String::new(),
                contact_title: String::new(),
                extra_context: String::new(),
            },
        }
    }

    #[test]
    fn push_does_not_wait_for_workers() {
        let (queue, mut rx) = WorkQueue::new();
        for row in 0..5_000 {
            queue.push(task(row)).unwrap();
        }
        assert_eq!(rx.try_recv().unwrap().prospect.row_index, 0);
    }

    #[test]
    fn push_fails_once_the_workers_are_gone() {
        let (queue, rx) = WorkQueue::new();
        drop(rx);
        assert_eq!(queue.push(task(2)).unwrap_err(), "work queue is closed");
    }
}
