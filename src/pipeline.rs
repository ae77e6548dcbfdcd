// src/pipeline.rs
//! The matching pipeline: validate, deduplicate, cap, score, filter, rank.
//!
//! Control flow is deterministic; only the score values coming back from
//! the matcher are not. Per-item failures never abort a run — they are
//! aggregated into the report and the caller decides whether to alert.

use anyhow::Result;
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::matcher::{JobMatcher, MatchError};
use crate::seen_store::SeenJobStore;
use crate::types::{JobPosting, MatchResult, ResumeProfile};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum score for a result to be kept (inclusive).
    pub score_threshold: u8,
    /// Minimum score for a result to be notified about (inclusive).
    pub notify_threshold: u8,
    /// Bound on postings scored per run; the rest stay unseen for the
    /// next run.
    pub max_postings_per_run: Option<usize>,
}

/// Per-run counters for everything that did not end up in the results.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub received: usize,
    pub rejected: usize,
    pub duplicate_in_batch: usize,
    pub already_seen: usize,
    pub deferred: usize,
    pub scored: usize,
    pub failed: usize,
    pub malformed: usize,
    pub quota_exhausted: bool,
}

#[derive(Debug)]
pub struct PipelineOutcome {
    /// Results at or above the score threshold, best first; ties keep
    /// input order.
    pub qualifying: Vec<MatchResult>,
    /// Results at or above the notify threshold, same ordering.
    pub notify_worthy: Vec<MatchResult>,
    pub report: PipelineReport,
}

pub struct MatchPipeline {
    config: PipelineConfig,
}

impl MatchPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run one batch through the pipeline. Postings are scored strictly
    /// sequentially: the backend is rate limited and pacing beats bursts.
    pub async fn run(
        &self,
        resume: &ResumeProfile,
        postings: Vec<JobPosting>,
        store: &SeenJobStore,
        matcher: &dyn JobMatcher,
    ) -> Result<PipelineOutcome> {
        let mut report = PipelineReport {
            received: postings.len(),
            ..Default::default()
        };

        // Validate
        let mut valid = Vec::with_capacity(postings.len());
        for posting in postings {
            match posting.validate() {
                Ok(()) => valid.push(posting),
                Err(e) => {
                    warn!("Rejected malformed posting: {e:#}");
                    report.rejected += 1;
                }
            }
        }

        // Deduplicate: first occurrence wins within the batch, anything the
        // store already knows is dropped without spending quota.
        let mut batch_keys = HashSet::new();
        let mut fresh = Vec::with_capacity(valid.len());
        for posting in valid {
            let key = posting.identity_key();
            if !batch_keys.insert(key.clone()) {
                report.duplicate_in_batch += 1;
                continue;
            }
            if self.store_contains(store, &key).await {
                report.already_seen += 1;
                continue;
            }
            fresh.push((key, posting));
        }

        // Cap: excess postings stay unseen and come back next run
        if let Some(cap) = self.config.max_postings_per_run {
            if fresh.len() > cap {
                report.deferred = fresh.len() - cap;
                fresh.truncate(cap);
            }
        }

        info!(
            "Pipeline input: {} received, {} to score (rejected {}, duplicates {}, seen {}, deferred {})",
            report.received,
            fresh.len(),
            report.rejected,
            report.duplicate_in_batch,
            report.already_seen,
            report.deferred
        );

        // Score sequentially. A key is recorded as seen only once its
        // posting reached a definitive outcome: a score, a malformed
        // response, or exhausted retries. A quota interrupt is not
        // definitive — the posting must be retried on a later run.
        let mut results: Vec<MatchResult> = Vec::new();
        for (key, posting) in fresh {
            match matcher.score(resume, &posting).await {
                Ok(m) => {
                    let now = Utc::now();
                    self.store_record(store, &key, now).await;
                    report.scored += 1;
                    results.push(MatchResult {
                        key,
                        posting,
                        score: m.score,
                        rationale: m.rationale,
                        cover_letter: m.cover_letter,
                        generated_at: now,
                    });
                }
                Err(MatchError::QuotaExceeded(message)) => {
                    let attempted = report.scored + report.failed + report.malformed;
                    if attempted == 0 {
                        anyhow::bail!(
                            "Scoring quota exhausted before any posting was scored: {message}"
                        );
                    }
                    error!(
                        "Scoring quota exhausted after {attempted} posting(s); keeping partial results: {message}"
                    );
                    report.quota_exhausted = true;
                    break;
                }
                Err(MatchError::ProviderUnavailable { attempts, message }) => {
                    warn!(
                        "Skipping {key}: scoring backend unavailable after {attempts} attempt(s): {message}"
                    );
                    self.store_record(store, &key, Utc::now()).await;
                    report.failed += 1;
                }
                Err(MatchError::MalformedResponse(message)) => {
                    warn!("Treating {key} as score 0, response was malformed: {message}");
                    let now = Utc::now();
                    self.store_record(store, &key, now).await;
                    report.malformed += 1;
                    results.push(MatchResult {
                        key,
                        posting,
                        score: 0,
                        rationale: String::new(),
                        cover_letter: String::new(),
                        generated_at: now,
                    });
                }
            }
        }

        // Filter and rank. `results` is in input order, so the stable sort
        // keeps tied scores in input order.
        let mut qualifying: Vec<MatchResult> = results
            .iter()
            .filter(|r| r.score >= self.config.score_threshold)
            .cloned()
            .collect();
        qualifying.sort_by_key(|r| Reverse(r.score));

        let mut notify_worthy: Vec<MatchResult> = results
            .iter()
            .filter(|r| r.score >= self.config.notify_threshold)
            .cloned()
            .collect();
        notify_worthy.sort_by_key(|r| Reverse(r.score));

        info!(
            "Pipeline done: {} scored, {} qualifying, {} notify-worthy",
            report.scored,
            qualifying.len(),
            notify_worthy.len()
        );

        Ok(PipelineOutcome {
            qualifying,
            notify_worthy,
            report,
        })
    }

    /// A store read failing mid-run is treated as "unseen" so one bad query
    /// degrades to a duplicate notification at worst, not a dead run.
    async fn store_contains(&self, store: &SeenJobStore, key: &str) -> bool {
        match store.contains(key).await {
            Ok(seen) => seen,
            Err(e) => {
                warn!("Seen-store lookup failed for {key}: {e:#}; treating as unseen");
                false
            }
        }
    }

    async fn store_record(&self, store: &SeenJobStore, key: &str, now: chrono::DateTime<Utc>) {
        if let Err(e) = store.record(key, now).await {
            warn!("Failed to record {key} in seen store: {e:#}");
        }
    }
}
