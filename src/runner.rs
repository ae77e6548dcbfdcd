// src/runner.rs
//! Wires the collaborators together and drives one full search pass.

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Local};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, SearchFilters};
use crate::listing::LinkedInListing;
use crate::matcher::{AiMatcher, ScoringClient, ScoringClientConfig};
use crate::notifier::TelegramNotifier;
use crate::pipeline::{MatchPipeline, PipelineConfig, PipelineReport};
use crate::resume;
use crate::seen_store::SeenJobStore;
use crate::sheet::ResultSheet;
use crate::utils::parse_time_string;

/// Scrape bound applied when no per-run cap is configured.
const DEFAULT_SCRAPE_LIMIT: usize = 25;

/// Pause between per-job notifications.
const NOTIFY_PAUSE: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Debug)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub jobs_found: usize,
    pub qualifying: usize,
    pub notified: usize,
    pub report: PipelineReport,
    pub duration: std::time::Duration,
}

pub struct Automation {
    config: AppConfig,
    listing: LinkedInListing,
    matcher: AiMatcher,
    notifier: TelegramNotifier,
    sheet: ResultSheet,
    pipeline: MatchPipeline,
}

impl Automation {
    pub fn new(config: AppConfig) -> Result<Self> {
        let listing = LinkedInListing::new(
            config.request_delay_seconds,
            config.request_timeout_seconds,
        )?;

        let client = ScoringClient::new(ScoringClientConfig {
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.clone(),
            timeout_seconds: config.request_timeout_seconds,
            max_retries: config.scoring_max_retries,
        })
        .context("Failed to create scoring client")?;
        let matcher = AiMatcher::new(client, config.cover_letter_threshold);

        let notifier = TelegramNotifier::new(
            config.telegram_bot_token.clone(),
            config.telegram_chat_id.clone(),
            config.telegram_enabled,
            config.request_timeout_seconds,
        )?;

        let sheet = ResultSheet::new(config.sheet_path.clone());

        let pipeline = MatchPipeline::new(PipelineConfig {
            score_threshold: config.score_threshold,
            notify_threshold: config.notify_threshold,
            max_postings_per_run: config.max_jobs_per_run,
        });

        Ok(Self {
            config,
            listing,
            matcher,
            notifier,
            sheet,
            pipeline,
        })
    }

    /// Run one full search pass. Fatal errors are pushed to the notifier
    /// (best-effort) before being returned.
    pub async fn run(&self) -> Result<RunSummary> {
        match self.execute().await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                if let Err(notify_err) = self.notifier.send_error(&format!("{e:#}")).await {
                    warn!("Failed to send error notification: {notify_err:#}");
                }
                Err(e)
            }
        }
    }

    async fn execute(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let started = std::time::Instant::now();
        info!("Starting job search run {run_id}");

        let profile = resume::extract_profile(&self.config.resume_path)?;
        let filters = SearchFilters::load(&self.config.filters_path)?;
        let store = SeenJobStore::open(&self.config.seen_db_path).await;

        let scrape_limit = self.config.max_jobs_per_run.unwrap_or(DEFAULT_SCRAPE_LIMIT);
        let postings = self.listing.search_jobs(&filters, scrape_limit).await?;
        let jobs_found = postings.len();

        if postings.is_empty() {
            info!("No jobs found for the current filters");
            if let Err(e) = self.notifier.send_message("⚠️ No jobs found in this search").await {
                warn!("Failed to send notification: {e:#}");
            }
            return Ok(RunSummary {
                run_id,
                jobs_found: 0,
                qualifying: 0,
                notified: 0,
                report: PipelineReport::default(),
                duration: started.elapsed(),
            });
        }

        let outcome = self
            .pipeline
            .run(&profile, postings, &store, &self.matcher)
            .await?;

        self.sheet.append_results(&outcome.qualifying)?;

        let mut notified = 0;
        for result in &outcome.notify_worthy {
            match self.notifier.send_job_notification(result).await {
                Ok(()) => notified += 1,
                Err(e) => warn!(
                    "Failed to notify about {} at {}: {e:#}",
                    result.posting.title, result.posting.company
                ),
            }
            tokio::time::sleep(NOTIFY_PAUSE).await;
        }

        if let Err(e) = self
            .notifier
            .send_run_summary(jobs_found, outcome.qualifying.len(), notified)
            .await
        {
            warn!("Failed to send run summary: {e:#}");
        }

        let summary = RunSummary {
            run_id,
            jobs_found,
            qualifying: outcome.qualifying.len(),
            notified,
            report: outcome.report,
            duration: started.elapsed(),
        };

        info!(
            "Run {run_id} complete in {:.1}s: {} found, {} qualifying, {} notified",
            summary.duration.as_secs_f64(),
            summary.jobs_found,
            summary.qualifying,
            summary.notified
        );

        Ok(summary)
    }
}

/// Run the automation once per day at the configured `HH:MM` local time.
pub async fn run_scheduled(config: AppConfig) -> Result<()> {
    let (hour, minute) = parse_time_string(&config.schedule_time)?;
    let automation = Automation::new(config)?;

    info!("Scheduling daily run at {hour:02}:{minute:02}");

    loop {
        let now = Local::now().naive_local();
        let mut target = now
            .date()
            .and_hms_opt(hour, minute, 0)
            .context("Invalid schedule time")?;
        if target <= now {
            target += ChronoDuration::days(1);
        }

        let wait = (target - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(60));
        info!("Next run at {target} ({}s from now)", wait.as_secs());
        tokio::time::sleep(wait).await;

        // One bad run must not kill the scheduler
        if let Err(e) = automation.run().await {
            error!("Scheduled run failed: {e:#}");
        }
    }
}
