//! The seller's service catalog, loaded from YAML and matched against research.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::research::CompanyResearch;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("service catalog not found at {0}")]
    NotFound(String),
    #[error("failed to read service catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid service catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pain_points_addressed: Vec<String>,
    #[serde(default)]
    pub ideal_for_industries: Vec<String>,
    #[serde(default)]
    pub roi_metrics: Vec<String>,
    #[serde(default)]
    pub key_differentiators: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    services: Vec<ServiceDefinition>,
}

pub fn load_catalog(path: &Path) -> Result<Vec<ServiceDefinition>, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)?;
    parse_catalog(&text)
}

pub fn parse_catalog(yaml: &str) -> Result<Vec<ServiceDefinition>, CatalogError> {
    let file: CatalogFile = serde_yaml::from_str(yaml)?;
    Ok(file.services)
}

/// Lazily loaded catalog shared by the content generator and the catalog endpoints.
pub struct CatalogStore {
    path: PathBuf,
    cached: RwLock<Option<Arc<Vec<ServiceDefinition>>>>,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: RwLock::new(None),
        }
    }

    /// A store that never touches the filesystem.
    pub fn with_services(services: Vec<ServiceDefinition>) -> Self {
        Self {
            path: PathBuf::new(),
            cached: RwLock::new(Some(Arc::new(services))),
        }
    }

    pub async fn get(&self) -> Result<Arc<Vec<ServiceDefinition>>, CatalogError> {
        if let Some(services) = self.cached.read().await.as_ref() {
            return Ok(services.clone());
        }

        let mut cached = self.cached.write().await;
        if let Some(services) = cached.as_ref() {
            return Ok(services.clone());
        }
        let services = Arc::new(load_catalog(&self.path)?);
        log::info!(
            "Loaded {} services from {}",
            services.len(),
            self.path.display()
        );
        *cached = Some(services.clone());
        Ok(services)
    }

    /// Re-reads the file. On error the previously cached catalog is kept.
    pub async fn reload(&self) -> Result<Arc<Vec<ServiceDefinition>>, CatalogError> {
        let services = Arc::new(load_catalog(&self.path)?);
        *self.cached.write().await = Some(services.clone());
        log::info!(
            "Reloaded {} services from {}",
            services.len(),
            self.path.display()
        );
        Ok(services)
    }
}

fn relevance(service: &ServiceDefinition, research_text: &str, industry: &str) -> f64 {
    let industry = industry.to_lowercase();
    let mut score = 0.0;

    // Empty strings would match everything through `contains`.
    if !industry.is_empty()
        && service.ideal_for_industries.iter().any(|ind| {
            let ind = ind.to_lowercase();
            !ind.is_empty() && (industry.contains(&ind) || ind.contains(&industry))
        })
    {
        score += 3.0;
    }

    for pain in &service.pain_points_addressed {
        let lowered = pain.to_lowercase();
        let words: HashSet<&str> = lowered.split_whitespace().collect();
        let overlap = words.iter().filter(|w| research_text.contains(**w)).count();
        score += overlap as f64 * 0.5;
    }

    let description = service.description.to_lowercase();
    let desc_words: HashSet<&str> = description.split_whitespace().collect();
    let desc_overlap = desc_words
        .iter()
        .filter(|w| w.chars().count() > 4 && research_text.contains(**w))
        .count();
    score + desc_overlap as f64 * 0.2
}

/// Keyword pre-filter: ranks the catalog against the research and keeps the best `top_n`.
///
/// Ties keep catalog order.
pub fn match_services(
    research: &CompanyResearch,
    industry: &str,
    catalog: &[ServiceDefinition],
    top_n: usize,
) -> Vec<ServiceDefinition> {
    let research_text = [
        research.overview.as_str(),
        &research.pain_points.join(" "),
        &research.tech_stack.join(" "),
        research.industry_context.as_str(),
        &research.opportunities.join(" "),
    ]
    .join(" ")
    .to_lowercase();

    let mut scored: Vec<(f64, &ServiceDefinition)> = catalog
        .iter()
        .map(|svc| (relevance(svc, &research_text, industry), svc))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(top_n)
        .map(|(_, svc)| svc.clone())
        .collect()
}

pub fn format_for_prompt(services: &[ServiceDefinition]) -> String {
    services
        .iter()
        .map(|svc| {
            format!(
                "### {}\n**Tagline:** {}\n**Description:** {}\n**Pain Points Addressed:** {}\n**ROI Metrics:** {}\n**Key Differentiators:** {}\n",
                svc.name,
                svc.tagline,
                svc.description,
                svc.pain_points_addressed.join(", "),
                svc.roi_metrics.join(", "),
                svc.key_differentiators.join(", "),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: &str, industries: &[&str], pains: &[&str], description: &str) -> ServiceDefinition {
        ServiceDefinition {
            id: id.to_string(),
            name: id.to_uppercase(),
            tagline: String::new(),
            description: description.to_string(),
            pain_points_addressed: pains.iter().map(|s| s.to_string()).collect(),
            ideal_for_industries: industries.iter().map(|s| s.to_string()).collect(),
            roi_metrics: vec![],
            key_differentiators: vec![],
        }
    }

    #[test]
    fn parses_catalog_yaml_with_defaults() {
        let yaml = r#"
services:
  - id: intent
    name: Intent Data
    pain_points_addressed: ["low pipeline visibility"]
  - id: enrich
    name: Data Enrichment
    tagline: Clean CRM data
"#;
        let services = parse_catalog(yaml).unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].pain_points_addressed, vec!["low pipeline visibility"]);
        assert!(services[0].roi_metrics.is_empty());
        assert_eq!(services[1].tagline, "Clean CRM data");
    }

    #[test]
    fn industry_match_outweighs_keyword_overlap() {
        let research = CompanyResearch {
            overview: "They struggle with stale records in their crm".to_string(),
            ..CompanyResearch::default()
        };
        let catalog = vec![
            service("enrich", &[], &["stale crm records"], ""),
            service("health", &["Healthcare"], &[], ""),
            service("other", &["Mining"], &[], ""),
        ];

        let ranked = match_services(&research, "healthcare providers", &catalog, 2);
        let ids: Vec<&str> = ranked.iter().map(|s| s.id.as_str()).collect();
        // health: 3.0 (industry containment); enrich: 3 words * 0.5 = 1.5
        assert_eq!(ids, vec!["health", "enrich"]);
    }

    #[test]
    fn description_words_need_more_than_four_chars() {
        let research = CompanyResearch {
            overview: "data teams want better analytics".to_string(),
            ..CompanyResearch::default()
        };
        let short = service("short", &[], &[], "data team");
        let long = service("long", &[], &[], "analytics platform");

        let ranked = match_services(&research, "", &[short, long], 2);
        assert_eq!(ranked[0].id, "long");
    }

    #[test]
    fn prompt_format_lists_every_section() {
        let mut svc = service("abm", &[], &["slow deals", "bad fit"], "Account based marketing");
        svc.roi_metrics = vec!["30% more pipeline".to_string()];
        let text = format_for_prompt(&[svc]);
        assert!(text.starts_with("### ABM\n"));
        assert!(text.contains("**Pain Points Addressed:** slow deals, bad fit\n"));
        assert!(text.contains("**ROI Metrics:** 30% more pipeline\n"));
    }

    #[tokio::test]
    async fn missing_catalog_file_is_not_found() {
        let store = CatalogStore::new("/definitely/not/here.yaml");
        assert!(matches!(store.get().await, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn reload_picks_up_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, "services:\n  - id: a\n    name: A\n").unwrap();

        let store = CatalogStore::new(&path);
        assert_eq!(store.get().await.unwrap().len(), 1);

        std::fs::write(&path, "services:\n  - id: a\n    name: A\n  - id: b\n    name: B\n").unwrap();
        assert_eq!(store.get().await.unwrap().len(), 1);
        assert_eq!(store.reload().await.unwrap().len(), 2);
        assert_eq!(store.get().await.unwrap().len(), 2);
    }
}
