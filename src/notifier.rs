// src/notifier.rs
//! Telegram notifier. Delivery is best-effort: failures are reported to the
//! caller for logging and never abort a run.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::types::MatchResult;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
    enabled: bool,
}

impl TelegramNotifier {
    pub fn new(
        bot_token: Option<String>,
        chat_id: Option<String>,
        enabled: bool,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        let (bot_token, chat_id, enabled) = match (bot_token, chat_id, enabled) {
            (Some(token), Some(chat), true) => (token, chat, true),
            (_, _, true) => {
                warn!("Telegram credentials missing, notifications disabled");
                (String::new(), String::new(), false)
            }
            _ => {
                info!("Telegram notifications disabled");
                (String::new(), String::new(), false)
            }
        };

        Ok(Self {
            client,
            bot_token,
            chat_id,
            enabled,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Send a raw message. A no-op when the notifier is disabled.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let url = format!("{TELEGRAM_API_BASE}/bot{}/sendMessage", self.bot_token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": false,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to call Telegram API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API returned {status}: {body}");
        }

        Ok(())
    }

    pub async fn send_job_notification(&self, result: &MatchResult) -> Result<()> {
        self.send_message(&format_job_message(result)).await
    }

    pub async fn send_run_summary(
        &self,
        jobs_found: usize,
        qualifying: usize,
        notified: usize,
    ) -> Result<()> {
        let message = format!(
            "📊 <b>Job Search Summary</b>\n\n\
             🔍 Jobs found: {jobs_found}\n\
             ✅ Qualifying: {qualifying}\n\
             ⭐ Notified: {notified}\n\n\
             Check the results sheet for details."
        );
        self.send_message(&message).await
    }

    pub async fn send_error(&self, error_message: &str) -> Result<()> {
        let message = format!(
            "⚠️ <b>Job Search Error</b>\n\n{}\n\nCheck the logs for details.",
            escape_html(error_message)
        );
        self.send_message(&message).await
    }
}

fn format_job_message(result: &MatchResult) -> String {
    format!(
        "🎯 <b>New Job Match!</b>\n\n\
         <b>Title:</b> {}\n\
         <b>Company:</b> {}\n\
         <b>Location:</b> {}\n\
         <b>Match Score:</b> {}/100\n\n\
         <b>Apply:</b> {}",
        escape_html(&result.posting.title),
        escape_html(&result.posting.company),
        escape_html(&result.posting.location),
        result.score,
        result.posting.link
    )
}

/// Telegram's HTML parse mode chokes on raw angle brackets in scraped text.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobPosting;
    use chrono::Utc;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("C++ & <Rust>"), "C++ &amp; &lt;Rust&gt;");
    }

    #[test]
    fn test_format_job_message() {
        let result = MatchResult {
            key: "https://x/1".to_string(),
            posting: JobPosting {
                title: "Backend <Engineer>".to_string(),
                company: "Acme & Co".to_string(),
                location: "Berlin".to_string(),
                link: "https://x/1".to_string(),
                description: "desc".to_string(),
                posted_at: None,
                easy_apply: false,
            },
            score: 85,
            rationale: String::new(),
            cover_letter: String::new(),
            generated_at: Utc::now(),
        };

        let message = format_job_message(&result);
        assert!(message.contains("Backend &lt;Engineer&gt;"));
        assert!(message.contains("Acme &amp; Co"));
        assert!(message.contains("85/100"));
        assert!(message.contains("https://x/1"));
    }

    #[tokio::test]
    async fn test_disabled_notifier_is_a_no_op() {
        let notifier = TelegramNotifier::new(None, None, false, 5).unwrap();
        assert!(!notifier.is_enabled());
        notifier.send_message("never sent").await.unwrap();
    }

    #[tokio::test]
    async fn test_enabled_without_credentials_disables_itself() {
        let notifier = TelegramNotifier::new(None, None, true, 5).unwrap();
        assert!(!notifier.is_enabled());
    }
}
