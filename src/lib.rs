// src/lib.rs
//! Automated job search: scrape LinkedIn postings, score them against a
//! resume with an LLM backend, persist qualifying matches to a CSV sheet
//! and push Telegram notifications for the best ones.

use anyhow::Result;

pub mod cli;
pub mod config;
pub mod listing;
pub mod matcher;
pub mod notifier;
pub mod pipeline;
pub mod resume;
pub mod runner;
pub mod seen_store;
pub mod sheet;
pub mod types;
pub mod utils;

pub use config::AppConfig;
pub use runner::{Automation, RunSummary};

/// Convenience entry point: one search pass with configuration from the
/// environment.
pub async fn run_once() -> Result<RunSummary> {
    let config = AppConfig::from_env()?;
    Automation::new(config)?.run().await
}
