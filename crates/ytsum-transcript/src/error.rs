//! Transcript error types.

use thiserror::Error;

pub type TranscriptResult<T> = Result<T, TranscriptError>;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Could not find a YouTube video id in '{0}'")]
    InvalidInput(String),

    #[error("Transcript backend returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No transcript available for {video_id}")]
    Exhausted { video_id: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TranscriptError {
    pub fn invalid_input(input: impl Into<String>) -> Self {
        Self::InvalidInput(input.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// HTTP status of an upstream rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// 403 from an upstream means quota exhaustion.
    pub fn is_quota_exceeded(&self) -> bool {
        self.status() == Some(403)
    }
}

/// Outcome of one fallback tier that produced no transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierError {
    /// Quota exhausted upstream. Skip the remaining tiers.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Network or HTTP failure. Try the next tier.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Tier answered but had no usable segments. Try the next tier.
    #[error("no usable transcript data")]
    Empty,
}

impl TierError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}

impl From<TranscriptError> for TierError {
    fn from(e: TranscriptError) -> Self {
        if e.is_quota_exceeded() {
            Self::QuotaExceeded(e.to_string())
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_detection() {
        let quota = TranscriptError::Http {
            status: 403,
            body: "quota".into(),
        };
        assert!(quota.is_quota_exceeded());
        assert!(TierError::from(quota).is_quota_exceeded());

        let missing = TranscriptError::Http {
            status: 404,
            body: String::new(),
        };
        assert!(!missing.is_quota_exceeded());
        assert!(matches!(TierError::from(missing), TierError::Unavailable(_)));
    }

    #[test]
    fn test_invalid_input_message() {
        assert_eq!(
            TranscriptError::invalid_input("not a url").to_string(),
            "Could not find a YouTube video id in 'not a url'"
        );
    }
}
