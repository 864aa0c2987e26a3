//! Summary and chat streamers.

use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};
use ytsum_models::ChatTurn;

use crate::cancel::CancelSignal;
use crate::error::{StreamError, StreamResult};
use crate::frames::sse_frames;
use crate::parser::SseFrame;
use crate::payload::{decode_payload, StreamEvent};

/// Callbacks invoked while a stream is consumed.
///
/// For one stream, `on_complete` and `on_error` are mutually exclusive and
/// fire at most once. Neither fires when the stream is cancelled.
pub trait StreamObserver: Send + Sync {
    /// One content piece, in arrival order.
    fn on_chunk(&self, chunk: &str);

    /// Stream finished; `text` is everything received.
    fn on_complete(&self, text: &str);

    /// Stream failed; chunks already delivered stay delivered.
    fn on_error(&self, error: &StreamError);
}

/// Observer that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StreamObserver for NoopObserver {
    fn on_chunk(&self, _chunk: &str) {}
    fn on_complete(&self, _text: &str) {}
    fn on_error(&self, _error: &StreamError) {}
}

/// How a stream ended.
#[derive(Debug)]
pub enum StreamOutcome {
    /// `[DONE]` or end of body
    Completed(String),
    /// Cancelled by the caller; `partial` is what had arrived
    Cancelled { partial: String },
    /// Failed; `partial` is what had arrived
    Failed { partial: String, error: StreamError },
}

impl StreamOutcome {
    /// Text received so far, whatever the outcome.
    pub fn text(&self) -> &str {
        match self {
            Self::Completed(text) => text,
            Self::Cancelled { partial } | Self::Failed { partial, .. } => partial,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Consume an SSE byte stream, reporting to `observer`.
///
/// Used by every streaming consumer. The body is dropped (and with it the
/// connection) on every exit path.
pub async fn drive_stream<S, B, E>(body: S, observer: &dyn StreamObserver, cancel: CancelSignal) -> StreamOutcome
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<StreamError> + Send,
{
    let frames = sse_frames(body, cancel.clone());
    futures_util::pin_mut!(frames);

    let mut accumulated = String::new();
    while let Some(frame) = frames.next().await {
        match frame {
            Ok(SseFrame::Data(data)) => match decode_payload(&data) {
                StreamEvent::Content(chunk) => {
                    accumulated.push_str(&chunk);
                    observer.on_chunk(&chunk);
                }
                StreamEvent::Error(message) => {
                    let error = StreamError::upstream(message);
                    observer.on_error(&error);
                    return StreamOutcome::Failed {
                        partial: accumulated,
                        error,
                    };
                }
                StreamEvent::Ignored => {}
            },
            Ok(SseFrame::Done) => break,
            Err(error) => {
                if cancel.is_cancelled() {
                    break;
                }
                observer.on_error(&error);
                return StreamOutcome::Failed {
                    partial: accumulated,
                    error,
                };
            }
        }
    }

    if cancel.is_cancelled() {
        debug!(received = accumulated.len(), "Stream cancelled");
        return StreamOutcome::Cancelled {
            partial: accumulated,
        };
    }

    observer.on_complete(&accumulated);
    StreamOutcome::Completed(accumulated)
}

/// Map a non-success response to a stream error.
pub async fn error_for_response(response: Response) -> StreamError {
    let status = response.status();
    let retry_after: Option<u64> = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());
    let body = response.text().await.unwrap_or_default();

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = retry_after.or_else(|| {
                serde_json::from_str::<serde_json::Value>(&body)
                    .ok()?
                    .get("retryAfter")?
                    .as_u64()
            });
            StreamError::RateLimited { retry_after }
        }
        StatusCode::SERVICE_UNAVAILABLE => {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or(body);
            StreamError::Configuration(message)
        }
        _ => StreamError::Http {
            status: status.as_u16(),
            body,
        },
    }
}

/// Send `request` and stream its body, honouring cancellation during connect.
async fn send_and_drive(request: RequestBuilder, observer: &dyn StreamObserver, mut cancel: CancelSignal) -> StreamOutcome {
    if cancel.is_cancelled() {
        return StreamOutcome::Cancelled {
            partial: String::new(),
        };
    }

    let sent = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return StreamOutcome::Cancelled { partial: String::new() };
        }
        sent = request.send() => sent,
    };

    let response = match sent {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            let error = error_for_response(response).await;
            warn!(error = %error, "Stream request rejected");
            observer.on_error(&error);
            return StreamOutcome::Failed {
                partial: String::new(),
                error,
            };
        }
        Err(e) => {
            let error = StreamError::from(e);
            warn!(error = %error, "Stream request failed");
            observer.on_error(&error);
            return StreamOutcome::Failed {
                partial: String::new(),
                error,
            };
        }
    };

    drive_stream(response.bytes_stream(), observer, cancel).await
}

fn streaming_client(connect_timeout: Duration) -> StreamResult<Client> {
    // No overall timeout: it would cut long streams short.
    Ok(Client::builder().connect_timeout(connect_timeout).build()?)
}

// =============================================================================
// Summary
// =============================================================================

/// Body of `POST /api/summarize`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub transcript: String,
    pub video_id: String,
    pub user_id: Option<String>,
}

/// Client for the summary stream endpoint.
#[derive(Debug, Clone)]
pub struct SummaryStreamer {
    http: Client,
    endpoint: String,
}

impl SummaryStreamer {
    /// Default path of the summary endpoint.
    pub const PATH: &'static str = "/api/summarize";

    /// Streamer against `{base_url}/api/summarize`.
    pub fn new(base_url: &str) -> StreamResult<Self> {
        Ok(Self {
            http: streaming_client(Duration::from_secs(10))?,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), Self::PATH),
        })
    }

    /// Use a full endpoint URL instead of the default path.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Stream a summary for one transcript.
    pub async fn stream(&self, request: &SummaryRequest, observer: &dyn StreamObserver, cancel: CancelSignal) -> StreamOutcome {
        info!(
            video_id = %request.video_id,
            transcript_len = request.transcript.len(),
            "Requesting summary stream"
        );
        let builder = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request);
        send_and_drive(builder, observer, cancel).await
    }
}

// =============================================================================
// Chat
// =============================================================================

/// Body of `POST /api/v1/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
    pub transcript: String,
}

/// Client for the chat stream endpoint.
#[derive(Debug, Clone)]
pub struct ChatStreamer {
    http: Client,
    endpoint: String,
}

impl ChatStreamer {
    pub const PATH: &'static str = "/api/v1/chat";

    pub fn new(base_url: &str) -> StreamResult<Self> {
        Ok(Self {
            http: streaming_client(Duration::from_secs(10))?,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), Self::PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Stream an assistant reply for the conversation so far.
    pub async fn stream(&self, request: &ChatRequest, observer: &dyn StreamObserver, cancel: CancelSignal) -> StreamOutcome {
        debug!(messages = request.messages.len(), "Requesting chat stream");
        let builder = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request);
        send_and_drive(builder, observer, cancel).await
    }
}
