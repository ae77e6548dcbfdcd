// src/matcher/client.rs
//! HTTP client for the OpenAI-compatible scoring backend.

use serde::Deserialize;
use tracing::{debug, warn};

use super::prompts;
use super::MatchError;

const MAX_COMPLETION_TOKENS: u32 = 1000;
const TEMPERATURE: f64 = 0.7;

#[derive(Debug, Clone)]
pub struct ScoringClientConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

/// Chat-completions client with bounded retries. One `chat` call consumes
/// one unit of provider quota; pacing between calls is the pipeline's
/// concern.
pub struct ScoringClient {
    client: reqwest::Client,
    config: ScoringClientConfig,
}

#[derive(Debug, serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScorePayload {
    score: i64,
    #[serde(default)]
    rationale: String,
}

impl ScoringClient {
    pub fn new(config: ScoringClientConfig) -> Result<Self, MatchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MatchError::ProviderUnavailable {
                attempts: 0,
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self { client, config })
    }

    /// Score a job against the resume. Returns `(score, rationale)` with the
    /// score clamped into `0..=100`.
    pub async fn score_job(
        &self,
        resume_text: &str,
        job_text: &str,
    ) -> Result<(u8, String), MatchError> {
        let prompt = prompts::scoring_prompt(resume_text, job_text);
        let output = self.chat(prompts::SCORING_SYSTEM, &prompt).await?;
        parse_score_response(&output)
    }

    /// Generate a cover letter for a job already known to score well.
    pub async fn generate_cover_letter(
        &self,
        resume_text: &str,
        job_text: &str,
    ) -> Result<String, MatchError> {
        let prompt = prompts::cover_letter_prompt(resume_text, job_text);
        let output = self.chat(prompts::COVER_LETTER_SYSTEM, &prompt).await?;

        let letter = strip_json_fences(&output).trim().to_string();
        if letter.is_empty() {
            return Err(MatchError::MalformedResponse(
                "backend returned an empty cover letter".to_string(),
            ));
        }
        Ok(letter)
    }

    /// One chat-completions round trip. Retries network errors, 429 rate
    /// limits and 5xx with exponential backoff, up to `max_retries`
    /// attempts. Quota exhaustion and other client errors are returned
    /// immediately.
    async fn chat(&self, system: &str, user: &str) -> Result<String, MatchError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request_body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let attempts = self.config.max_retries.max(1);
        let mut last_message = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                // Backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Scoring call attempt {}/{} failed ({}), retrying in {}ms",
                    attempt,
                    attempts,
                    last_message,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&request_body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_message = e.to_string();
                    continue;
                }
            };

            let status = response.status();

            if status.is_success() {
                let body: ChatResponse =
                    response
                        .json()
                        .await
                        .map_err(|e| MatchError::MalformedResponse(format!(
                            "Failed to decode chat response: {e}"
                        )))?;

                let content = body
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| {
                        MatchError::MalformedResponse("chat response has no content".to_string())
                    })?;

                debug!("Scoring backend responded ({} chars)", content.len());
                return Ok(content);
            }

            let body = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<ApiError>(&body).ok();
            let message = parsed
                .as_ref()
                .map(|e| e.error.message.clone())
                .unwrap_or_else(|| format!("HTTP {status}: {body}"));
            let code = parsed.and_then(|e| e.error.code);

            // Out of quota is terminal for the whole run, never retried
            if status.as_u16() == 402 || code.as_deref() == Some("insufficient_quota") {
                return Err(MatchError::QuotaExceeded(message));
            }

            if status.as_u16() == 429 || status.is_server_error() {
                last_message = message;
                continue;
            }

            // Auth and other client errors won't improve with retries
            return Err(MatchError::ProviderUnavailable {
                attempts: attempt + 1,
                message,
            });
        }

        Err(MatchError::ProviderUnavailable {
            attempts,
            message: last_message,
        })
    }
}

/// Parse the scoring JSON, clamping the score into `0..=100`.
fn parse_score_response(output: &str) -> Result<(u8, String), MatchError> {
    let text = strip_json_fences(output);
    let payload: ScorePayload = serde_json::from_str(text)
        .map_err(|e| MatchError::MalformedResponse(format!("{e}; raw: {}", text.trim())))?;

    let score = payload.score.clamp(0, 100) as u8;
    Ok((score, payload.rationale))
}

/// Strip ```json ... ``` or ``` ... ``` fences some models wrap around JSON.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    for prefix in ["```json", "```"] {
        if let Some(stripped) = text.strip_prefix(prefix) {
            return stripped
                .trim_start()
                .strip_suffix("```")
                .map(|s| s.trim())
                .unwrap_or_else(|| stripped.trim_start());
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences() {
        assert_eq!(
            strip_json_fences("```json\n{\"score\": 80}\n```"),
            "{\"score\": 80}"
        );
        assert_eq!(strip_json_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_score_response() {
        let (score, rationale) =
            parse_score_response("{\"score\": 85, \"rationale\": \"strong overlap\"}").unwrap();
        assert_eq!(score, 85);
        assert_eq!(rationale, "strong overlap");
    }

    #[test]
    fn test_parse_score_response_clamps() {
        assert_eq!(parse_score_response("{\"score\": 150}").unwrap().0, 100);
        assert_eq!(parse_score_response("{\"score\": -5}").unwrap().0, 0);
    }

    #[test]
    fn test_parse_score_response_fenced() {
        let (score, _) = parse_score_response("```json\n{\"score\": 42}\n```").unwrap();
        assert_eq!(score, 42);
    }

    #[test]
    fn test_parse_score_response_malformed() {
        assert!(matches!(
            parse_score_response("I'd rate this about 80 out of 100"),
            Err(MatchError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_score_response("{\"score\": \"eighty\"}"),
            Err(MatchError::MalformedResponse(_))
        ));
    }
}
