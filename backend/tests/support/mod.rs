#![allow(dead_code)]

use async_trait::async_trait;
use backend::config::Settings;
use backend::history::HistoryStore;
use backend::job_controller::queue::{start_workers, WorkQueue};
use backend::job_controller::state::{start_job_updater, JobsState, UpdaterConfig};
use backend::pipeline::catalog::{CatalogStore, ServiceDefinition};
use backend::pipeline::content::{PitchContent, SlideContent};
use backend::pipeline::gamma::DeckResult;
use backend::pipeline::research::CompanyResearch;
use backend::pipeline::runner::{Pipeline, PipelineOptions};
use backend::pipeline::{ContentGenerator, DeckBuilder, PipelineError, Researcher};
use backend::services::AppContext;
use common::jobs::JobStatus;
use common::model::prospect::ProspectRow;
use common::responses::Theme;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Settings rooted in `dir`, with no delays and no database unless asked for.
pub fn test_settings(dir: &Path, with_database: bool) -> Settings {
    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("UPLOAD_DIR", dir.join("uploads").display().to_string());
    vars.insert("OUTPUT_DIR", dir.join("output").display().to_string());
    vars.insert("SERVICES_CATALOG_PATH", dir.join("catalog.yaml").display().to_string());
    vars.insert("STAGE_DELAY_MS", "0".to_string());
    vars.insert("ROW_MAX_RETRIES", "0".to_string());
    vars.insert("ROW_RETRY_DELAY_SECS", "0".to_string());
    vars.insert("MAX_ROWS_PER_UPLOAD", "5".to_string());
    vars.insert("WORKER_CONCURRENCY", "2".to_string());
    vars.insert(
        "DATABASE_PATH",
        if with_database {
            dir.join("history.sqlite").display().to_string()
        } else {
            String::new()
        },
    );
    let settings = Settings::from_lookup(|key| vars.get(key).cloned()).unwrap();
    settings.ensure_dirs().unwrap();
    settings
}

pub fn instant_options(row_max_retries: u32) -> PipelineOptions {
    PipelineOptions {
        stage_delay: Duration::ZERO,
        row_max_retries,
        row_retry_delay: Duration::ZERO,
    }
}

/// Fails every company whose name contains "Broken"; fails "Flaky" companies on their first call only.
/// Panics on "Panicking" companies.
#[derive(Default)]
pub struct FakeResearcher {
    pub calls: AtomicU32,
    flaky_calls: AtomicU32,
}

#[async_trait]
impl Researcher for FakeResearcher {
    async fn research(&self, prospect: &ProspectRow) -> Result<CompanyResearch, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prospect.company_name.contains("Panicking") {
            panic!("research client crashed on {}", prospect.company_name);
        }
        if prospect.company_name.contains("Broken") {
            return Err(PipelineError::GenerationFailed("research unavailable".to_string()));
        }
        if prospect.company_name.contains("Flaky") && self.flaky_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(PipelineError::GenerationFailed("temporary outage".to_string()));
        }
        Ok(CompanyResearch {
            company_name: prospect.company_name.clone(),
            overview: format!("{} sells industrial sensors.", prospect.company_name),
            pain_points: vec!["incomplete CRM data".to_string()],
            raw_research: "notes".to_string(),
            ..CompanyResearch::default()
        })
    }
}

pub struct FakeGenerator;

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate(
        &self,
        prospect: &ProspectRow,
        research: &CompanyResearch,
    ) -> Result<PitchContent, PipelineError> {
        let slides = vec![SlideContent {
            slide_number: 1,
            title: format!("Growing {}", prospect.company_name),
            body: research.overview.clone(),
            speaker_notes: String::new(),
        }];
        Ok(PitchContent {
            company_name: prospect.company_name.clone(),
            input_text: format!("# Growing {}", prospect.company_name),
            slides,
            mapped_services: Vec::new(),
        })
    }
}

#[derive(Default)]
pub struct FakeDeckBuilder {
    pub themes_fail: bool,
}

#[async_trait]
impl DeckBuilder for FakeDeckBuilder {
    async fn create_deck(&self, content: &PitchContent) -> Result<DeckResult, PipelineError> {
        let slug = content.company_name.to_lowercase().replace(' ', "-");
        Ok(DeckResult {
            gamma_id: format!("gen-{}", slug),
            url: format!("https://gamma.app/docs/{}", slug),
            pptx_url: format!("https://gamma.app/export/{}.pptx", slug),
            pdf_url: String::new(),
        })
    }

    async fn list_themes(&self) -> Result<Vec<Theme>, PipelineError> {
        if self.themes_fail {
            return Err(PipelineError::Api {
                service: "Gamma",
                status: 401,
                body: "invalid API key".to_string(),
            });
        }
        Ok(vec![Theme {
            id: "oasis".to_string(),
            name: "Oasis".to_string(),
        }])
    }
}

pub fn sample_services() -> Vec<ServiceDefinition> {
    vec![ServiceDefinition {
        id: "data-enrichment".to_string(),
        name: "B2B Data Enrichment".to_string(),
        tagline: "Verified records".to_string(),
        description: "Appends firmographic data".to_string(),
        pain_points_addressed: vec!["incomplete CRM data".to_string()],
        ideal_for_industries: vec!["Software".to_string()],
        roi_metrics: Vec::new(),
        key_differentiators: Vec::new(),
    }]
}

/// Spawns the updater and the worker pool against the fakes and returns the shared state.
pub fn start_backend(settings: Settings, history: Option<HistoryStore>, deck_builder: Arc<FakeDeckBuilder>) -> AppContext {
    let (tx, rx) = mpsc::channel(100);
    let jobs = JobsState::new(tx.clone());
    let config = UpdaterConfig {
        output_dir: settings.output_dir.clone(),
        retention: settings.job_retention,
        download_grace: settings.download_grace,
    };
    tokio::spawn(start_job_updater(jobs.clone(), rx, config));

    let pipeline = Arc::new(Pipeline::new(
        Arc::new(FakeResearcher::default()),
        Arc::new(FakeGenerator),
        deck_builder.clone(),
        history.clone(),
        instant_options(settings.row_max_retries),
    ));
    let (queue, queue_rx) = WorkQueue::new();
    start_workers(settings.worker_concurrency, queue_rx, pipeline, tx);

    AppContext {
        settings: Arc::new(settings),
        jobs,
        queue,
        catalog: Arc::new(CatalogStore::with_services(sample_services())),
        deck_builder,
        history,
    }
}

/// Polls until the job settles or five seconds pass.
pub async fn wait_until_finished(jobs: &JobsState, job_id: &str) -> JobStatus {
    for _ in 0..250 {
        if let Some(status) = jobs.snapshot(job_id).await {
            if status.status.is_finished() {
                return status;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {} did not finish in time", job_id);
}
