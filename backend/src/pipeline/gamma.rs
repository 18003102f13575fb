//! Client for the Gamma generations API.
//!
//! A deck is built in two steps: `POST /generations` returns a `generationId`,
//! then `GET /generations/{id}` is polled until the status turns `completed`
//! or `failed`, or until the configured maximum wait has passed.

use async_trait::async_trait;
use common::responses::Theme;
use log::{debug, info};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use super::content::PitchContent;
use super::retry::{retry, RetryPolicy};
use super::{DeckBuilder, PipelineError};
use crate::config::Settings;

const SERVICE: &str = "Gamma";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeckResult {
    pub gamma_id: String,
    pub url: String,
    pub pptx_url: String,
    pub pdf_url: String,
}

/// What one poll of a generation told us.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(DeckResult),
    Failed(String),
    Pending,
}

fn str_field<'a>(data: &'a Value, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Reads the deck URLs out of a completed generation.
///
/// Export links may sit at the top level (`pptxUrl`, `pdfUrl`) or under
/// `exports`; the top-level ones win.
pub fn parse_generation(data: &Value) -> DeckResult {
    let exports = data.get("exports").filter(|e| e.is_object());
    let export = |key: &str| -> String {
        exports
            .and_then(|e| e.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    let mut pptx_url = str_field(data, "pptxUrl").to_string();
    if pptx_url.is_empty() {
        pptx_url = export("pptx");
    }
    let mut pdf_url = str_field(data, "pdfUrl").to_string();
    if pdf_url.is_empty() {
        pdf_url = export("pdf");
    }

    DeckResult {
        gamma_id: str_field(data, "generationId").to_string(),
        url: str_field(data, "gammaUrl").to_string(),
        pptx_url,
        pdf_url,
    }
}

pub fn poll_outcome(data: &Value) -> PollOutcome {
    match str_field(data, "status") {
        "completed" => PollOutcome::Completed(parse_generation(data)),
        "failed" => {
            let message = match data.get("error") {
                Some(Value::Object(err)) => err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error")
                    .to_string(),
                Some(Value::String(s)) => s.clone(),
                Some(other) if !other.is_null() => other.to_string(),
                _ => "Unknown error".to_string(),
            };
            PollOutcome::Failed(message)
        }
        _ => PollOutcome::Pending,
    }
}

/// Themes come back either as a bare array or wrapped in `data` (or `themes`).
pub fn parse_themes(body: Value) -> Vec<Theme> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data").or_else(|| map.remove("themes")) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<Theme>(item).ok())
        .collect()
}

pub fn generation_request(content: &PitchContent, theme_id: &str) -> Value {
    let mut payload = json!({
        "inputText": content.input_text,
        "textMode": "preserve",
        "format": "presentation",
        "numCards": content.card_count(),
        "exportAs": "pptx",
    });
    if !theme_id.is_empty() {
        payload["themeId"] = Value::String(theme_id.to_string());
    }
    payload
}

async fn error_for_status(resp: Response) -> Result<Response, PipelineError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(PipelineError::Api {
        service: SERVICE,
        status: status.as_u16(),
        body,
    })
}

#[derive(Clone)]
pub struct GammaClient {
    client: Client,
    base_url: String,
    api_key: String,
    theme_id: String,
    poll_interval: Duration,
    max_wait: Duration,
    submit_policy: RetryPolicy,
}

impl GammaClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.gamma_api_base_url.trim_end_matches('/').to_string(),
            api_key: settings.gamma_api_key.clone(),
            theme_id: settings.gamma_theme_id.clone(),
            poll_interval: settings.gamma_poll_interval,
            max_wait: settings.gamma_max_wait,
            submit_policy: RetryPolicy::deck_submission(),
        }
    }

    async fn submit(&self, payload: &Value) -> Result<String, PipelineError> {
        let resp = self
            .client
            .post(format!("{}/generations", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .timeout(Duration::from_secs(60))
            .json(payload)
            .send()
            .await?;
        let data: Value = error_for_status(resp).await?.json().await?;

        match str_field(&data, "generationId") {
            "" => Err(PipelineError::MissingField {
                service: SERVICE,
                field: "generationId",
            }),
            id => Ok(id.to_string()),
        }
    }

    async fn poll(&self, generation_id: &str) -> Result<DeckResult, PipelineError> {
        let interval = self.poll_interval.max(Duration::from_millis(1));
        let url = format!("{}/generations/{}", self.base_url, generation_id);
        let mut elapsed = Duration::ZERO;

        while elapsed < self.max_wait {
            tokio::time::sleep(interval).await;
            elapsed += interval;

            let resp = self
                .client
                .get(&url)
                .header("X-API-KEY", &self.api_key)
                .timeout(Duration::from_secs(30))
                .send()
                .await?;
            if !resp.status().is_success() {
                debug!("Poll of {} returned {}", generation_id, resp.status());
                continue;
            }

            let data: Value = resp.json().await?;
            match poll_outcome(&data) {
                PollOutcome::Completed(mut deck) => {
                    if deck.gamma_id.is_empty() {
                        deck.gamma_id = generation_id.to_string();
                    }
                    return Ok(deck);
                }
                PollOutcome::Failed(message) => return Err(PipelineError::GenerationFailed(message)),
                PollOutcome::Pending => {}
            }
        }

        Err(PipelineError::Timeout {
            generation_id: generation_id.to_string(),
            waited: self.max_wait,
        })
    }
}

#[async_trait]
impl DeckBuilder for GammaClient {
    async fn create_deck(&self, content: &PitchContent) -> Result<DeckResult, PipelineError> {
        let payload = generation_request(content, &self.theme_id);
        let label = format!("deck submission for {}", content.company_name);
        let generation_id = retry(self.submit_policy, &label, || self.submit(&payload)).await?;
        info!(
            "Gamma generation {} started for {}",
            generation_id, content.company_name
        );
        self.poll(&generation_id).await
    }

    async fn list_themes(&self) -> Result<Vec<Theme>, PipelineError> {
        let resp = self
            .client
            .get(format!("{}/themes", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;
        let body: Value = error_for_status(resp).await?.json().await?;
        Ok(parse_themes(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::content::SlideContent;

    #[test]
    fn top_level_export_urls_win() {
        let data = json!({
            "generationId": "gen_1",
            "status": "completed",
            "gammaUrl": "https://gamma.app/docs/abc",
            "pptxUrl": "https://cdn/top.pptx",
            "exports": {"pptx": "https://cdn/nested.pptx", "pdf": "https://cdn/nested.pdf"}
        });
        assert_eq!(
            parse_generation(&data),
            DeckResult {
                gamma_id: "gen_1".to_string(),
                url: "https://gamma.app/docs/abc".to_string(),
                pptx_url: "https://cdn/top.pptx".to_string(),
                pdf_url: "https://cdn/nested.pdf".to_string(),
            }
        );
    }

    #[test]
    fn poll_outcomes() {
        assert_eq!(poll_outcome(&json!({"status": "pending"})), PollOutcome::Pending);
        assert_eq!(poll_outcome(&json!({})), PollOutcome::Pending);
        assert_eq!(
            poll_outcome(&json!({"status": "failed", "error": {"message": "quota exceeded"}})),
            PollOutcome::Failed("quota exceeded".to_string())
        );
        assert_eq!(
            poll_outcome(&json!({"status": "failed"})),
            PollOutcome::Failed("Unknown error".to_string())
        );
        assert!(matches!(
            poll_outcome(&json!({"status": "completed", "gammaUrl": "u"})),
            PollOutcome::Completed(DeckResult { ref url, .. }) if url == "u"
        ));
    }

    #[test]
    fn request_body_includes_theme_only_when_set() {
        let content = PitchContent {
            company_name: "Acme".to_string(),
            slides: vec![SlideContent {
                slide_number: 1,
                title: "T".to_string(),
                body: "B".to_string(),
                speaker_notes: String::new(),
            }],
            mapped_services: vec![],
            input_text: "# T\n\nB".to_string(),
        };

        let without = generation_request(&content, "");
        assert_eq!(without["numCards"], 1);
        assert_eq!(without["textMode"], "preserve");
        assert_eq!(without["exportAs"], "pptx");
        assert!(without.get("themeId").is_none());

        let with = generation_request(&content, "theme_42");
        assert_eq!(with["themeId"], "theme_42");
    }

    #[test]
    fn themes_parse_from_either_shape() {
        let bare = parse_themes(json!([{"id": "t1", "name": "Dark"}, {"id": "t2"}]));
        assert_eq!(bare.len(), 2);
        assert_eq!(bare[0].name, "Dark");
        assert_eq!(bare[1].name, "");

        let wrapped = parse_themes(json!({"data": [{"id": "t3", "name": "Light", "extra": 1}]}));
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].id, "t3");

        assert!(parse_themes(json!({"unexpected": true})).is_empty());
    }
}
