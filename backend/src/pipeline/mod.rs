//! Per-row deck generation: research, pitch writing and deck building.
//!
//! Each external service sits behind a trait so the worker pool can run
//! against the real HTTP clients in production and in-process fakes in tests:
//!
//! - [`Researcher`]: company research (`research::OpenRouterResearcher`)
//! - [`ContentGenerator`]: service selection and slide text (`content::OpenRouterContentGenerator`)
//! - [`DeckBuilder`]: presentation rendering (`gamma::GammaClient`)
//!
//! [`runner::Pipeline`] drives the three in order for one row and reports
//! stage changes to the job updater.

pub mod catalog;
pub mod content;
pub mod gamma;
pub mod llm;
pub mod research;
pub mod retry;
pub mod runner;

use async_trait::async_trait;
use common::model::prospect::ProspectRow;
use common::responses::Theme;
use std::time::Duration;
use thiserror::Error;

use self::catalog::CatalogError;
use self::content::PitchContent;
use self::gamma::DeckResult;
use self::research::CompanyResearch;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} API returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{service} response is missing {field}")]
    MissingField {
        service: &'static str,
        field: &'static str,
    },
    #[error("deck generation {generation_id} timed out after {waited:?}")]
    Timeout {
        generation_id: String,
        waited: Duration,
    },
    #[error("deck generation failed: {0}")]
    GenerationFailed(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, prospect: &ProspectRow) -> Result<CompanyResearch, PipelineError>;
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        prospect: &ProspectRow,
        research: &CompanyResearch,
    ) -> Result<PitchContent, PipelineError>;
}

#[async_trait]
pub trait DeckBuilder: Send + Sync {
    async fn create_deck(&self, content: &PitchContent) -> Result<DeckResult, PipelineError>;
    async fn list_themes(&self) -> Result<Vec<Theme>, PipelineError>;
}
