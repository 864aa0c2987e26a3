//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Transcript error: {0}")]
    Transcript(#[from] ytsum_transcript::TranscriptError),

    #[error("Cache error: {0}")]
    Cache(#[from] ytsum_cache::CacheError),

    #[error("Stream error: {0}")]
    Stream(#[from] ytsum_stream::StreamError),
}

impl ClientError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
