// src/matcher/mod.rs
//! Scoring of job postings against the resume, backed by a generative model.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::types::{JobPosting, ResumeProfile};

pub mod client;
pub mod prompts;

pub use client::{ScoringClient, ScoringClientConfig};

/// Descriptions shorter than this are scored 0 without spending quota.
const MIN_DESCRIPTION_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum MatchError {
    /// Network/auth failure after bounded retries. Skips this posting.
    #[error("scoring backend unavailable after {attempts} attempt(s): {message}")]
    ProviderUnavailable { attempts: u32, message: String },

    /// Provider quota exhausted. Stops scoring for the rest of the run.
    #[error("scoring backend quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The backend answered but the score could not be parsed.
    #[error("malformed scoring response: {0}")]
    MalformedResponse(String),
}

/// What the matcher produces for one posting.
#[derive(Debug, Clone)]
pub struct ScoredMatch {
    pub score: u8,
    pub rationale: String,
    pub cover_letter: String,
}

/// Capability seam for the pipeline: anything that can score a posting
/// against a resume. The production implementation calls the LLM backend;
/// tests use a scripted stub.
#[async_trait]
pub trait JobMatcher: Send + Sync {
    async fn score(
        &self,
        resume: &ResumeProfile,
        posting: &JobPosting,
    ) -> Result<ScoredMatch, MatchError>;
}

/// Production matcher. Scores every posting, then generates a cover letter
/// for those meeting the cover-letter threshold.
pub struct AiMatcher {
    client: ScoringClient,
    cover_letter_threshold: u8,
}

impl AiMatcher {
    pub fn new(client: ScoringClient, cover_letter_threshold: u8) -> Self {
        Self {
            client,
            cover_letter_threshold,
        }
    }
}

#[async_trait]
impl JobMatcher for AiMatcher {
    async fn score(
        &self,
        resume: &ResumeProfile,
        posting: &JobPosting,
    ) -> Result<ScoredMatch, MatchError> {
        if posting.description.trim().chars().count() < MIN_DESCRIPTION_CHARS {
            warn!(
                "Description too short for {} at {}, scoring 0 without calling the backend",
                posting.title, posting.company
            );
            return Ok(ScoredMatch {
                score: 0,
                rationale: String::new(),
                cover_letter: String::new(),
            });
        }

        let (score, rationale) = self
            .client
            .score_job(&resume.raw_text, &posting.description)
            .await?;

        info!(
            "Scored {} at {}: {}/100",
            posting.title, posting.company, score
        );

        let cover_letter = if score >= self.cover_letter_threshold {
            match self
                .client
                .generate_cover_letter(&resume.raw_text, &posting.description)
                .await
            {
                Ok(letter) => letter,
                // Quota exhaustion must stop the run; a flaky letter call
                // should not discard a perfectly good score.
                Err(e @ MatchError::QuotaExceeded(_)) => return Err(e),
                Err(e) => {
                    warn!(
                        "Cover letter generation failed for {} at {}: {e}",
                        posting.title, posting.company
                    );
                    String::new()
                }
            }
        } else {
            String::new()
        };

        Ok(ScoredMatch {
            score,
            rationale,
            cover_letter,
        })
    }
}
