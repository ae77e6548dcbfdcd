// src/config.rs
//! Environment-driven application configuration plus the search filters file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub resume_path: PathBuf,
    pub filters_path: PathBuf,
    pub sheet_path: PathBuf,
    pub seen_db_path: PathBuf,
    pub score_threshold: u8,
    pub cover_letter_threshold: u8,
    pub notify_threshold: u8,
    pub max_jobs_per_run: Option<usize>,
    pub request_delay_seconds: u64,
    pub request_timeout_seconds: u64,
    pub scoring_max_retries: u32,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_enabled: bool,
    pub schedule_time: String,
}

impl AppConfig {
    /// Load configuration from the process environment. `.env` is read by
    /// main before this is called.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            resume_path: PathBuf::from(require_env("RESUME_PATH")?),
            filters_path: PathBuf::from(env_or("FILTERS_PATH", "config/filters.json")),
            sheet_path: PathBuf::from(env_or("SHEET_PATH", "data/jobs.csv")),
            seen_db_path: PathBuf::from(env_or("SEEN_DB_PATH", "data/seen_jobs.db")),
            score_threshold: parse_env("SCORE_THRESHOLD", 50)?,
            cover_letter_threshold: parse_env("COVER_LETTER_THRESHOLD", 50)?,
            notify_threshold: parse_env("NOTIFY_THRESHOLD", 70)?,
            max_jobs_per_run: parse_env_opt("MAX_JOBS_PER_RUN")?,
            request_delay_seconds: parse_env("REQUEST_DELAY_SECONDS", 10)?,
            request_timeout_seconds: parse_env("REQUEST_TIMEOUT_SECONDS", 30)?,
            scoring_max_retries: parse_env("SCORING_MAX_RETRIES", 3)?,
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID").ok(),
            telegram_enabled: env_or("ENABLE_TELEGRAM", "false").eq_ignore_ascii_case("true"),
            schedule_time: env_or("SCHEDULE_TIME", "17:00"),
        };

        info!(
            "Loaded configuration: model={}, score_threshold={}, notify_threshold={}",
            config.openai_model, config.score_threshold, config.notify_threshold
        );

        Ok(config)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a number, got '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_env_opt<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a number, got '{}'", key, raw)),
        Err(_) => Ok(None),
    }
}

/// Search criteria handed to the listing source. Multi-value fields are
/// comma-separated, matching the original filters file format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub remote: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub easy_apply: bool,
}

impl SearchFilters {
    /// Load filters from the JSON file. A missing or unparseable file is
    /// fatal for the run.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read filters file: {}", path.display()))?;
        let filters: SearchFilters = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse filters file: {}", path.display()))?;

        info!("Loaded search filters: {:?}", filters);
        Ok(filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_parse_full() {
        let json = r#"{
            "keyword": "rust engineer",
            "location": "Berlin",
            "experience_level": "Entry level, Associate",
            "remote": "Remote",
            "job_type": "Full-time",
            "easy_apply": true
        }"#;
        let filters: SearchFilters = serde_json::from_str(json).unwrap();
        assert_eq!(filters.keyword, "rust engineer");
        assert_eq!(filters.experience_level, "Entry level, Associate");
        assert!(filters.easy_apply);
    }

    #[test]
    fn test_filters_parse_defaults() {
        let filters: SearchFilters = serde_json::from_str("{}").unwrap();
        assert!(filters.keyword.is_empty());
        assert!(!filters.easy_apply);
    }
}
