//! OpenRouter client for summary and chat streams.
//!
//! Requests use the OpenAI-compatible chat completions API with
//! `stream: true`; the response body is relayed frame by frame.

use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{info, warn};
use ytsum_models::{ChatRole, ChatTurn};

use crate::config::OpenRouterConfig;
use crate::error::{ApiError, ApiResult};

/// Transcripts longer than this are cut before prompting.
pub const MAX_TRANSCRIPT_CHARS: usize = 100_000;

const SUMMARY_SYSTEM_PROMPT: &str = r#"You summarize YouTube video transcripts.

Write a clear markdown summary:
- Start with a one or two sentence overview
- Follow with the key points as a bulleted list
- End with a short takeaway if the video has one

Do not include timestamps. Do not invent details that are not in the transcript."#;

const CHAT_SYSTEM_PROMPT: &str = r#"You answer questions about a YouTube video using only its transcript.

If the transcript does not contain the answer, say so. Keep answers short and use markdown where it helps."#;

/// One message sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LlmMessage {
    pub role: &'static str,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

impl From<&ChatTurn> for LlmMessage {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: turn.content.clone(),
        }
    }
}

/// Chat completions request.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    stream: bool,
}

/// OpenRouter API client.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl OpenRouterClient {
    /// Create a client, or `None` when no API key is configured.
    pub fn from_config(config: &OpenRouterConfig) -> ApiResult<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        // Connect timeout only: streams are bounded by the relay.
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Some(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
        }))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start a streaming completion and return the open response.
    pub async fn stream(&self, messages: &[LlmMessage]) -> ApiResult<Response> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        info!(model = %self.model, messages = messages.len(), "Starting completion stream");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("X-Title", "YouTube Summaries")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::GatewayTimeout
                } else {
                    ApiError::bad_gateway(format!("OpenRouter request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "OpenRouter rejected completion");

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited {
                retry_after: retry_after.unwrap_or(60),
            },
            _ => ApiError::bad_gateway(format!("OpenRouter returned {}", status)),
        })
    }
}

/// Messages for summarizing one transcript.
pub fn summary_messages(transcript: &str) -> Vec<LlmMessage> {
    vec![
        LlmMessage::system(SUMMARY_SYSTEM_PROMPT),
        LlmMessage::user(format!(
            "Summarize this transcript:\n\n{}",
            truncate_transcript(transcript)
        )),
    ]
}

/// Messages for answering the latest question in `turns`.
pub fn chat_messages(transcript: &str, turns: &[ChatTurn]) -> Vec<LlmMessage> {
    let mut messages = Vec::with_capacity(turns.len() + 1);
    messages.push(LlmMessage::system(format!(
        "{}\n\nTranscript:\n{}",
        CHAT_SYSTEM_PROMPT,
        truncate_transcript(transcript)
    )));
    messages.extend(turns.iter().map(LlmMessage::from));
    messages
}

/// Cut a transcript to [`MAX_TRANSCRIPT_CHARS`] on a char boundary.
fn truncate_transcript(transcript: &str) -> &str {
    match transcript.char_indices().nth(MAX_TRANSCRIPT_CHARS) {
        Some((idx, _)) => &transcript[..idx],
        None => transcript,
    }
}
