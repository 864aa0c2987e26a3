//! Streaming error types.

use thiserror::Error;

pub type StreamResult<T> = Result<T, StreamError>;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    #[error("Service not configured: {0}")]
    Configuration(String),

    #[error("Stream endpoint returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StreamError {
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Message suitable for end users.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "Too many requests. Please wait a moment and try again.",
            Self::Configuration(_) => "Summaries are temporarily unavailable.",
            _ => "Failed to generate summary.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        assert_eq!(
            StreamError::upstream("boom").user_message(),
            "Failed to generate summary."
        );
        assert_eq!(
            StreamError::RateLimited { retry_after: Some(3) }.user_message(),
            "Too many requests. Please wait a moment and try again."
        );
    }
}
