use common::jobs::{RowResult, RowStage};
use common::model::prospect::ProspectRow;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::gamma::DeckResult;
use super::research::CompanyResearch;
use super::{ContentGenerator, DeckBuilder, PipelineError, Researcher};
use crate::config::Settings;
use crate::history::{HistoryStore, NewDeck};
use crate::job_controller::queue::RowTask;
use crate::job_controller::state::JobUpdate;

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Pause between stages, to stay under the external APIs' rate limits.
    pub stage_delay: Duration,
    pub row_max_retries: u32,
    pub row_retry_delay: Duration,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            stage_delay: settings.stage_delay,
            row_max_retries: settings.row_max_retries,
            row_retry_delay: settings.row_retry_delay,
        }
    }
}

pub struct Pipeline {
    researcher: Arc<dyn Researcher>,
    generator: Arc<dyn ContentGenerator>,
    deck_builder: Arc<dyn DeckBuilder>,
    history: Option<HistoryStore>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        researcher: Arc<dyn Researcher>,
        generator: Arc<dyn ContentGenerator>,
        deck_builder: Arc<dyn DeckBuilder>,
        history: Option<HistoryStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            researcher,
            generator,
            deck_builder,
            history,
            options,
        }
    }

    /// Runs one row to a terminal outcome and reports it as `RowFinished`.
    ///
    /// A failed attempt is re-run up to `row_max_retries` times. Only the last
    /// attempt's outcome is reported; errors never escape this function.
    pub async fn process(&self, task: &RowTask, updates: &mpsc::Sender<JobUpdate>) -> RowResult {
        let prospect = &task.prospect;
        let mut retries = 0;

        let result = loop {
            match self.run_once(task, updates).await {
                Ok(deck) => {
                    info!(
                        "Job {} row {} ({}): deck ready at {}",
                        task.job_id, prospect.row_index, prospect.company_name, deck.url
                    );
                    break RowResult {
                        row_index: prospect.row_index,
                        company_name: prospect.company_name.clone(),
                        status: RowStage::Complete,
                        deck_url: deck.url,
                        pptx_url: deck.pptx_url,
                        pdf_url: deck.pdf_url,
                        error: String::new(),
                    };
                }
                Err(e) if retries < self.options.row_max_retries => {
                    retries += 1;
                    warn!(
                        "Job {} row {} ({}) failed: {}; retry {}/{} in {:?}",
                        task.job_id,
                        prospect.row_index,
                        prospect.company_name,
                        e,
                        retries,
                        self.options.row_max_retries,
                        self.options.row_retry_delay
                    );
                    tokio::time::sleep(self.options.row_retry_delay).await;
                }
                Err(e) => {
                    error!(
                        "Job {} row {} ({}) failed: {}",
                        task.job_id, prospect.row_index, prospect.company_name, e
                    );
                    break RowResult {
                        row_index: prospect.row_index,
                        company_name: prospect.company_name.clone(),
                        status: RowStage::Failed,
                        error: e.to_string(),
                        ..RowResult::default()
                    };
                }
            }
        };

        let _ = updates
            .send(JobUpdate::RowFinished {
                job_id: task.job_id.clone(),
                result: result.clone(),
            })
            .await;
        result
    }

    async fn stage(&self, task: &RowTask, stage: RowStage, updates: &mpsc::Sender<JobUpdate>) {
        info!(
            "Job {} row {} ({}): {}",
            task.job_id,
            task.prospect.row_index,
            task.prospect.company_name,
            stage.as_str()
        );
        let _ = updates
            .send(JobUpdate::RowStage {
                job_id: task.job_id.clone(),
                row_index: task.prospect.row_index,
                stage,
            })
            .await;
    }

    async fn run_once(&self, task: &RowTask, updates: &mpsc::Sender<JobUpdate>) -> Result<DeckResult, PipelineError> {
        let prospect = &task.prospect;

        self.stage(task, RowStage::Researching, updates).await;
        let research = self.research(prospect).await?;
        tokio::time::sleep(self.options.stage_delay).await;

        self.stage(task, RowStage::GeneratingContent, updates).await;
        let pitch = self.generator.generate(prospect, &research).await?;
        tokio::time::sleep(self.options.stage_delay).await;

        self.stage(task, RowStage::CreatingDeck, updates).await;
        let deck = self.deck_builder.create_deck(&pitch).await?;

        if let Some(history) = self.history.clone() {
            let job_id = task.job_id.clone();
            let company_name = prospect.company_name.clone();
            let contact_name = prospect.contact_name.clone();
            let deck = deck.clone();
            let recorded = tokio::task::spawn_blocking(move || {
                history.record_deck(&NewDeck {
                    job_id: &job_id,
                    company_name: &company_name,
                    contact_name: &contact_name,
                    deck: &deck,
                    research: &research,
                    pitch: &pitch,
                })
            })
            .await;
            match recorded {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("Could not record deck for {}: {}", prospect.company_name, e),
                Err(e) => warn!("Could not record deck for {}: {}", prospect.company_name, e),
            }
        }

        Ok(deck)
    }

    /// Research with the cache in front when history is enabled.
    async fn research(&self, prospect: &ProspectRow) -> Result<CompanyResearch, PipelineError> {
        let Some(history) = self.history.clone() else {
            return self.researcher.research(prospect).await;
        };

        let name = prospect.company_name.clone();
        let lookup = {
            let history = history.clone();
            tokio::task::spawn_blocking(move || history.cached_research(&name)).await
        };
        match lookup {
            Ok(Ok(Some(cached))) => {
                info!("Using cached research for {}", prospect.company_name);
                return Ok(cached);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => warn!("Research cache lookup failed for {}: {}", prospect.company_name, e),
            Err(e) => warn!("Research cache lookup failed for {}: {}", prospect.company_name, e),
        }

        let research = self.researcher.research(prospect).await?;

        let name = prospect.company_name.clone();
        let to_store = research.clone();
        match tokio::task::spawn_blocking(move || history.store_research(&name, &to_store)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Could not cache research for {}: {}", prospect.company_name, e),
            Err(e) => warn!("Could not cache research for {}: {}", prospect.company_name, e),
        }
        Ok(research)
    }
}
