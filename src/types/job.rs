// src/types/job.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scraped job listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    pub description: String,
    pub posted_at: Option<String>,
    #[serde(default)]
    pub easy_apply: bool,
}

impl JobPosting {
    /// Reject postings that cannot be meaningfully scored or stored.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            anyhow::bail!("Job posting has empty title (company: {:?})", self.company);
        }
        if self.company.trim().is_empty() {
            anyhow::bail!("Job posting has empty company (title: {:?})", self.title);
        }
        Ok(())
    }

    /// Deduplication key. The link is canonical when it is a well-formed
    /// http(s) URL; otherwise title|company|location.
    pub fn identity_key(&self) -> String {
        if let Ok(url) = reqwest::Url::parse(&self.link) {
            if matches!(url.scheme(), "http" | "https") {
                return self.link.clone();
            }
        }
        format!("{}|{}|{}", self.title, self.company, self.location)
    }
}

/// Outcome of matching one posting against the resume.
/// Carries an owned snapshot of the posting for the sheet and the notifier;
/// `key` is the identity used by the seen store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub key: String,
    pub posting: JobPosting,
    pub score: u8,
    pub rationale: String,
    pub cover_letter: String,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(title: &str, company: &str, link: &str) -> JobPosting {
        JobPosting {
            title: title.to_string(),
            company: company.to_string(),
            location: "Berlin".to_string(),
            link: link.to_string(),
            description: "desc".to_string(),
            posted_at: None,
            easy_apply: false,
        }
    }

    #[test]
    fn test_validate_rejects_empty_title_or_company() {
        assert!(posting("Engineer", "Acme", "https://x/1").validate().is_ok());
        assert!(posting("", "Acme", "https://x/1").validate().is_err());
        assert!(posting("Engineer", "  ", "https://x/1").validate().is_err());
    }

    #[test]
    fn test_identity_key_prefers_link() {
        let p = posting("Engineer", "Acme", "https://www.linkedin.com/jobs/view/123");
        assert_eq!(p.identity_key(), "https://www.linkedin.com/jobs/view/123");
    }

    #[test]
    fn test_identity_key_falls_back_on_bad_link() {
        let p = posting("Engineer", "Acme", "not a url");
        assert_eq!(p.identity_key(), "Engineer|Acme|Berlin");

        let p = posting("Engineer", "Acme", "");
        assert_eq!(p.identity_key(), "Engineer|Acme|Berlin");
    }

    #[test]
    fn test_identity_key_rejects_non_http_scheme() {
        let p = posting("Engineer", "Acme", "mailto:jobs@acme.test");
        assert_eq!(p.identity_key(), "Engineer|Acme|Berlin");
    }
}
