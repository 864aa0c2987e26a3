//! Relay of an LLM completion stream to the caller as SSE.

use std::convert::Infallible;
use std::pin::Pin;
use std::time::{Duration, Instant};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream, StreamExt};
use serde_json::json;
use tracing::{debug, warn};
use ytsum_stream::{decode_payload, sse_frames, CancelSignal, SseFrame, StreamEvent, StreamResult};

use crate::metrics;

pub const STREAM_TIMEOUT_MESSAGE: &str = "Stream timed out";
pub const STREAM_INTERRUPTED_MESSAGE: &str = "Stream interrupted";

type FrameStream = Pin<Box<dyn Stream<Item = StreamResult<SseFrame>> + Send>>;

struct RelayState {
    frames: FrameStream,
    deadline: tokio::time::Instant,
    started: Instant,
    kind: &'static str,
    finished: bool,
}

impl RelayState {
    fn finish(&mut self, outcome: &str) {
        self.finished = true;
        metrics::record_stream(self.kind, outcome, self.started.elapsed().as_secs_f64());
    }
}

fn content_event(text: &str) -> Event {
    Event::default().data(json!({ "content": text }).to_string())
}

fn error_event(message: &str) -> Event {
    Event::default().data(json!({ "error": message }).to_string())
}

/// Re-emit an upstream completion stream in the app shape.
///
/// Each content delta becomes `data: {"content": ..}`. The stream ends with
/// `data: [DONE]`, or with a single `data: {"error": ..}` when the upstream
/// fails or `max_duration` elapses. Dropping the response (client disconnect)
/// drops the upstream body.
pub fn relay_llm_stream(
    response: reqwest::Response,
    max_duration: Duration,
    kind: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let state = RelayState {
        frames: Box::pin(sse_frames(response.bytes_stream(), CancelSignal::never())),
        deadline: tokio::time::Instant::now() + max_duration,
        started: Instant::now(),
        kind,
        finished: false,
    };

    let events = stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        loop {
            let next = match tokio::time::timeout_at(state.deadline, state.frames.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(kind = state.kind, "Upstream stream exceeded its time budget");
                    state.finish("timeout");
                    return Some((Ok(error_event(STREAM_TIMEOUT_MESSAGE)), state));
                }
            };

            let event = match next {
                None | Some(Ok(SseFrame::Done)) => {
                    state.finish("completed");
                    Event::default().data("[DONE]")
                }
                Some(Err(e)) => {
                    warn!(kind = state.kind, error = %e, "Upstream stream failed");
                    state.finish("failed");
                    error_event(STREAM_INTERRUPTED_MESSAGE)
                }
                Some(Ok(SseFrame::Data(data))) => match decode_payload(&data) {
                    StreamEvent::Content(text) => content_event(&text),
                    StreamEvent::Error(message) => {
                        warn!(kind = state.kind, error = %message, "Upstream reported an error mid-stream");
                        state.finish("failed");
                        error_event(&message)
                    }
                    StreamEvent::Ignored => {
                        debug!(kind = state.kind, "Skipping upstream frame");
                        continue;
                    }
                },
            };

            return Some((Ok(event), state));
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use axum::body::Bytes;

    fn upstream<S>(chunks: S) -> reqwest::Response
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
    {
        let body = reqwest::Body::wrap_stream(chunks);
        reqwest::Response::from(axum::http::Response::new(body))
    }

    async fn relayed_body(response: reqwest::Response, max_duration: Duration) -> String {
        let sse = relay_llm_stream(response, max_duration, "summary");
        let body = axum::body::to_bytes(sse.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_relays_deltas_in_app_shape() {
        let chunks = vec![
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n")),
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel")),
            Ok(Bytes::from_static(b"lo\"}}]}\n\n: OPENROUTER PROCESSING\n\n")),
            Ok(Bytes::from_static(b"data: [DONE]\n\n")),
        ];
        let body = relayed_body(upstream(stream::iter(chunks)), Duration::from_secs(5)).await;

        assert_eq!(body, "data: {\"content\":\"Hello\"}\n\ndata: [DONE]\n\n");
    }

    #[tokio::test]
    async fn test_end_of_body_counts_as_done() {
        let chunks = vec![Ok(Bytes::from_static(b"data: {\"content\":\"Hi\"}\n\n"))];
        let body = relayed_body(upstream(stream::iter(chunks)), Duration::from_secs(5)).await;

        assert!(body.ends_with("data: [DONE]\n\n"));
    }

    #[tokio::test]
    async fn test_upstream_error_ends_stream() {
        let chunks = vec![
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"Part\"}}]}\n\n")),
            Ok(Bytes::from_static(b"data: {\"error\":{\"message\":\"provider overloaded\"}}\n\n")),
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"never sent\"}}]}\n\n")),
        ];
        let body = relayed_body(upstream(stream::iter(chunks)), Duration::from_secs(5)).await;

        assert_eq!(
            body,
            "data: {\"content\":\"Part\"}\n\ndata: {\"error\":\"provider overloaded\"}\n\n"
        );
    }

    #[tokio::test]
    async fn test_time_budget_ends_stalled_stream() {
        let first = stream::iter(vec![Ok(Bytes::from_static(
            b"data: {\"content\":\"Slow\"}\n\n",
        ))]);
        let stalled = first.chain(stream::pending());
        let body = relayed_body(upstream(stalled), Duration::from_millis(100)).await;

        assert_eq!(
            body,
            format!(
                "data: {{\"content\":\"Slow\"}}\n\ndata: {{\"error\":\"{}\"}}\n\n",
                STREAM_TIMEOUT_MESSAGE
            )
        );
    }
}
