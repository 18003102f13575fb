use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use backend::config::Settings;
use backend::history::HistoryStore;
use backend::job_controller::queue::{start_workers, WorkQueue};
use backend::job_controller::state::{start_janitor, start_job_updater, JobsState, UpdaterConfig};
use backend::pipeline::catalog::CatalogStore;
use backend::pipeline::content::OpenRouterContentGenerator;
use backend::pipeline::gamma::GammaClient;
use backend::pipeline::llm::OpenRouterClient;
use backend::pipeline::research::{load_system_prompt, OpenRouterResearcher};
use backend::pipeline::runner::{Pipeline, PipelineOptions};
use backend::services::{self, AppContext};
use env_logger::Env;
use include_dir::{include_dir, Dir};
use log::{error, info, warn};
use mime_guess::from_path;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

static STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/static/dist");

const JANITOR_INTERVAL: Duration = Duration::from_secs(60);

async fn serve_embedded(req: HttpRequest) -> HttpResponse {
    let path = req.path().trim_start_matches('/');
    if path == "api" || path.starts_with("api/") {
        return HttpResponse::NotFound().json(json!({ "detail": "Not Found" }));
    }
    let file_path = if path.is_empty() { "index.html" } else { path };

    match STATIC_DIR.get_file(file_path) {
        Some(file) => {
            let mime = from_path(file_path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(file.contents().to_vec())
        }
        None => match STATIC_DIR.get_file("index.html") {
            Some(index) => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(index.contents().to_vec()),
            None => HttpResponse::NotFound().body("Not Found"),
        },
    }
}

fn open_history(settings: &Settings) -> Option<HistoryStore> {
    let path = settings.database_path.as_ref()?;
    match HistoryStore::open(path) {
        Ok(store) => {
            info!("Deck history at {}", path.display());
            Some(store)
        }
        Err(e) => {
            warn!("History disabled, could not open {}: {}", path.display(), e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };
    settings.ensure_dirs()?;
    if settings.openrouter_api_key.is_empty() {
        warn!("OPENROUTER_API_KEY is not set; research and generation will fail");
    }
    if settings.gamma_api_key.is_empty() {
        warn!("GAMMA_API_KEY is not set; deck creation will fail");
    }
    let settings = Arc::new(settings);
    let url = settings.bind_url();

    let history = open_history(&settings);
    let catalog = Arc::new(CatalogStore::new(settings.services_catalog_path.clone()));

    let llm = OpenRouterClient::new(&settings);
    let researcher = Arc::new(OpenRouterResearcher::new(
        llm.clone(),
        settings.research_model.clone(),
        load_system_prompt(&settings.research_system_prompt_path),
    ));
    let generator = Arc::new(OpenRouterContentGenerator::new(llm, catalog.clone(), &settings));
    let deck_builder = Arc::new(GammaClient::new(&settings));

    // Job controller state
    let (tx, rx) = mpsc::channel(100);
    let jobs_state = JobsState::new(tx.clone());

    let updater_state = jobs_state.clone();
    let updater_config = UpdaterConfig {
        output_dir: settings.output_dir.clone(),
        retention: settings.job_retention,
        download_grace: settings.download_grace,
    };
    tokio::spawn(async move {
        start_job_updater(updater_state, rx, updater_config).await;
    });
    tokio::spawn(start_janitor(tx.clone(), JANITOR_INTERVAL));

    let pipeline = Arc::new(Pipeline::new(
        researcher,
        generator,
        deck_builder.clone(),
        history.clone(),
        PipelineOptions::from_settings(&settings),
    ));
    let (queue, queue_rx) = WorkQueue::new();
    start_workers(settings.worker_concurrency, queue_rx, pipeline, tx);
    info!("Started {} pipeline worker(s)", settings.worker_concurrency);

    let ctx = AppContext {
        settings: settings.clone(),
        jobs: jobs_state,
        queue,
        catalog,
        deck_builder,
        history,
    };

    if settings.open_browser {
        let url_clone = url.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(500));
            let _ = webbrowser::open(&url_clone);
        });
    }

    info!("{} running at {}", settings.app_title, url);

    HttpServer::new(move || {
        App::new()
            .configure(|cfg| services::configure(cfg, &ctx))
            .default_service(web::route().to(serve_embedded))
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
