//! Decoding of `data:` payloads.

use serde_json::Value;
use tracing::debug;

/// Meaning of one `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text to append to the accumulated output
    Content(String),
    /// Explicit error reported by the upstream
    Error(String),
    /// Nothing to act on (keep-alives, role deltas, malformed JSON)
    Ignored,
}

/// Decode a payload in either the app shape or the OpenAI/OpenRouter shape.
///
/// - `{"content": "..."}` is content
/// - `{"error": "..."}` or `{"error": {"message": "..."}}` is an error
/// - `{"choices": [{"delta": {"content": "..."}}]}` is content
///
/// Malformed JSON is treated as noise and ignored.
pub fn decode_payload(data: &str) -> StreamEvent {
    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, payload_len = data.len(), "Skipping undecodable stream payload");
            return StreamEvent::Ignored;
        }
    };

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        };
        return StreamEvent::Error(message);
    }

    let content = value.get("content").and_then(Value::as_str).or_else(|| {
        value
            .get("choices")?
            .get(0)?
            .get("delta")?
            .get("content")?
            .as_str()
    });

    match content {
        Some(text) if !text.is_empty() => StreamEvent::Content(text.to_string()),
        _ => StreamEvent::Ignored,
    }
}
