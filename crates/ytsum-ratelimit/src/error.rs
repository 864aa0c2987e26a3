//! Rate limiter error types.

use thiserror::Error;

pub type LimitResult<T> = Result<T, RateLimitError>;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Counter store timed out after {0} ms")]
    Timeout(u64),

    #[error("Unexpected script reply: {0}")]
    UnexpectedReply(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl RateLimitError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }
}
