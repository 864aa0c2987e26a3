//! Client configuration.

use std::path::PathBuf;

use ytsum_cache::default_cache_dir;
use ytsum_transcript::TranscriptConfig;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the summary/chat API
    pub api_url: String,
    /// Forwarded with summary requests when set
    pub user_id: Option<String>,
    /// Directory of the local analysis cache
    pub cache_dir: PathBuf,
    /// Transcript retrieval settings
    pub transcript: TranscriptConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            user_id: None,
            cache_dir: default_cache_dir(),
            transcript: TranscriptConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("YTSUM_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            user_id: std::env::var("YTSUM_USER_ID")
                .ok()
                .filter(|id| !id.trim().is_empty()),
            cache_dir: std::env::var("YTSUM_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            transcript: TranscriptConfig::from_env(),
        }
    }
}
