//! Runtime settings read from the environment.
//!
//! Values are taken from real environment variables first and from a `.env`
//! file in the working directory second (loaded with `dotenvy`, which never
//! overrides variables that are already set). Every key has a default so the
//! server starts with nothing configured; calls to the external APIs simply
//! fail per row until the API keys are provided.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub open_browser: bool,

    pub gamma_api_key: String,
    pub gamma_theme_id: String,
    pub gamma_api_base_url: String,
    pub gamma_poll_interval: Duration,
    pub gamma_max_wait: Duration,

    pub openrouter_api_key: String,
    pub openrouter_api_url: String,
    pub research_model: String,
    pub service_mapping_model: String,
    pub service_mapping_max_tokens: u32,
    pub pitch_generation_model: String,
    pub pitch_max_tokens: u32,

    /// Company pitching its services; used in prompts.
    pub seller_name: String,
    pub app_title: String,
    pub app_referer: String,

    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_rows_per_upload: usize,
    pub services_catalog_path: PathBuf,
    pub research_system_prompt_path: PathBuf,
    /// `None` disables deck history and the research cache.
    pub database_path: Option<PathBuf>,

    pub worker_concurrency: usize,
    pub stage_delay: Duration,
    pub row_max_retries: u32,
    pub row_retry_delay: Duration,

    pub job_retention: Duration,
    pub download_grace: Duration,
}

impl Settings {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let database_path = match lookup("DATABASE_PATH") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(PathBuf::from(v.trim())),
            None => Some(PathBuf::from("./pitchdeck.sqlite")),
        };

        Ok(Self {
            host: get("HOST", "127.0.0.1"),
            port: parse("PORT", &get("PORT", "8080"))?,
            open_browser: parse_bool("OPEN_BROWSER", &get("OPEN_BROWSER", "false"))?,

            gamma_api_key: get("GAMMA_API_KEY", ""),
            gamma_theme_id: get("GAMMA_THEME_ID", ""),
            gamma_api_base_url: get("GAMMA_API_BASE_URL", "https://api.gamma.app/api")
                .trim_end_matches('/')
                .to_string(),
            gamma_poll_interval: Duration::from_secs(parse(
                "GAMMA_POLL_INTERVAL_SECS",
                &get("GAMMA_POLL_INTERVAL_SECS", "5"),
            )?),
            gamma_max_wait: Duration::from_secs(parse(
                "GAMMA_MAX_WAIT_SECS",
                &get("GAMMA_MAX_WAIT_SECS", "300"),
            )?),

            openrouter_api_key: get("OPENROUTER_API_KEY", ""),
            openrouter_api_url: get(
                "OPENROUTER_API_URL",
                "https://openrouter.ai/api/v1/chat/completions",
            ),
            research_model: get("RESEARCH_MODEL", "perplexity/sonar"),
            service_mapping_model: get("SERVICE_MAPPING_MODEL", "anthropic/claude-3.5-sonnet"),
            service_mapping_max_tokens: parse(
                "SERVICE_MAPPING_MAX_TOKENS",
                &get("SERVICE_MAPPING_MAX_TOKENS", "1024"),
            )?,
            pitch_generation_model: get("PITCH_GENERATION_MODEL", "anthropic/claude-3.5-sonnet"),
            pitch_max_tokens: parse("PITCH_MAX_TOKENS", &get("PITCH_MAX_TOKENS", "8192"))?,

            seller_name: get("SELLER_NAME", "LakeB2B"),
            app_title: get("APP_TITLE", "LakeB2B Pitch Deck Creator"),
            app_referer: get("APP_REFERER", "https://lakeb2b.com"),

            upload_dir: PathBuf::from(get("UPLOAD_DIR", "./uploads")),
            output_dir: PathBuf::from(get("OUTPUT_DIR", "./output")),
            max_rows_per_upload: parse(
                "MAX_ROWS_PER_UPLOAD",
                &get("MAX_ROWS_PER_UPLOAD", "100"),
            )?,
            services_catalog_path: PathBuf::from(get(
                "SERVICES_CATALOG_PATH",
                "./data/services_catalog.yaml",
            )),
            research_system_prompt_path: PathBuf::from(get(
                "RESEARCH_SYSTEM_PROMPT_PATH",
                "./data/research_system_prompt.txt",
            )),
            database_path,

            worker_concurrency: parse::<usize>(
                "WORKER_CONCURRENCY",
                &get("WORKER_CONCURRENCY", "1"),
            )?
            .max(1),
            stage_delay: Duration::from_millis(parse(
                "STAGE_DELAY_MS",
                &get("STAGE_DELAY_MS", "2000"),
            )?),
            row_max_retries: parse("ROW_MAX_RETRIES", &get("ROW_MAX_RETRIES", "2"))?,
            row_retry_delay: Duration::from_secs(parse(
                "ROW_RETRY_DELAY_SECS",
                &get("ROW_RETRY_DELAY_SECS", "10"),
            )?),

            job_retention: Duration::from_secs(parse(
                "JOB_RETENTION_SECS",
                &get("JOB_RETENTION_SECS", "86400"),
            )?),
            download_grace: Duration::from_secs(parse(
                "DOWNLOAD_GRACE_SECS",
                &get("DOWNLOAD_GRACE_SECS", "600"),
            )?),
        })
    }

    /// Creates the upload and output directories if they don't exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.output_dir)
    }

    pub fn bind_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.max_rows_per_upload, 100);
        assert_eq!(settings.worker_concurrency, 1);
        assert_eq!(settings.research_model, "perplexity/sonar");
        assert_eq!(settings.stage_delay, Duration::from_secs(2));
        assert_eq!(
            settings.database_path,
            Some(PathBuf::from("./pitchdeck.sqlite"))
        );
        assert!(!settings.open_browser);
    }

    #[test]
    fn overrides_and_empty_database_path() {
        let settings = settings_from(&[
            ("PORT", "9000"),
            ("WORKER_CONCURRENCY", "0"),
            ("DATABASE_PATH", ""),
            ("GAMMA_API_BASE_URL", "https://example.test/v1/"),
            ("OPEN_BROWSER", "yes"),
        ])
        .unwrap();
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.worker_concurrency, 1);
        assert_eq!(settings.database_path, None);
        assert_eq!(settings.gamma_api_base_url, "https://example.test/v1");
        assert!(settings.open_browser);
    }

    #[test]
    fn rejects_non_numeric_values() {
        let err = settings_from(&[("MAX_ROWS_PER_UPLOAD", "lots")]).unwrap_err();
        assert!(err.to_string().contains("MAX_ROWS_PER_UPLOAD"));
    }
}
