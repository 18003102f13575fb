//! HTTP surface under `/api`.
//!
//! Each submodule owns one scope and exposes `configure_routes()`; `configure`
//! registers the shared state and every scope on an `App`.

use actix_web::web;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::AppError;
use crate::history::HistoryStore;
use crate::job_controller::queue::WorkQueue;
use crate::job_controller::state::JobsState;
use crate::pipeline::catalog::CatalogStore;
use crate::pipeline::DeckBuilder;

pub mod catalog;
pub mod health;
pub mod history;
pub mod single;
pub mod status;
pub mod themes;
pub mod upload;

/// Everything the handlers share, cloned into each worker's `App`.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub jobs: JobsState,
    pub queue: WorkQueue,
    pub catalog: Arc<CatalogStore>,
    pub deck_builder: Arc<dyn DeckBuilder>,
    pub history: Option<HistoryStore>,
}

pub fn configure(cfg: &mut web::ServiceConfig, ctx: &AppContext) {
    let json_config = web::JsonConfig::default()
        .limit(10 * 1024 * 1024)
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());

    cfg.app_data(json_config)
        .app_data(web::Data::from(ctx.settings.clone()))
        .app_data(web::Data::new(ctx.jobs.clone()))
        .app_data(web::Data::new(ctx.queue.clone()))
        .app_data(web::Data::from(ctx.catalog.clone()))
        .app_data(web::Data::from(ctx.deck_builder.clone()))
        .app_data(web::Data::new(ctx.history.clone()))
        .service(health::configure_routes())
        .service(upload::configure_routes())
        .service(status::configure_routes())
        .service(status::configure_download_routes())
        .service(single::configure_routes())
        .service(themes::configure_routes())
        .service(catalog::configure_routes())
        .service(history::configure_routes());
}

/// Short job id: the first 8 hex chars of a v4 UUID.
pub fn new_job_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_are_eight_hex_chars() {
        let id = new_job_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_job_id());
    }
}
