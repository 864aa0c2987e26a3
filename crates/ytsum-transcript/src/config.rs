//! Transcript configuration.

use std::time::Duration;

/// Configuration for transcript retrieval.
#[derive(Debug, Clone)]
pub struct TranscriptConfig {
    /// Base URL of the transcript backend
    pub backend_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Comma-separated caption languages
    pub languages: String,
    /// Enables the direct YouTube tier
    pub youtube_api_key: Option<String>,
    /// Base URL for direct YouTube requests
    pub youtube_base_url: String,
    /// Return bundled demo content when every tier fails
    pub demo_fallback: bool,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(20),
            languages: "en".to_string(),
            youtube_api_key: None,
            youtube_base_url: "https://www.youtube.com".to_string(),
            demo_fallback: true,
        }
    }
}

impl TranscriptConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend_url: std::env::var("TRANSCRIPT_BACKEND_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.backend_url),
            timeout: Duration::from_secs(
                std::env::var("TRANSCRIPT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(20),
            ),
            languages: std::env::var("TRANSCRIPT_LANGUAGES").unwrap_or(defaults.languages),
            youtube_api_key: std::env::var("YOUTUBE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            youtube_base_url: std::env::var("YOUTUBE_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.youtube_base_url),
            demo_fallback: std::env::var("TRANSCRIPT_DEMO_FALLBACK")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }

    /// Point at a specific backend, keeping other defaults.
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// First configured language code.
    pub fn primary_language(&self) -> &str {
        self.languages
            .split(',')
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("en")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_defaults() {
        let config = TranscriptConfig::default();
        assert_eq!(config.backend_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.primary_language(), "en");
        assert!(config.demo_fallback);
        assert!(config.youtube_api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("TRANSCRIPT_BACKEND_URL", "http://backend:9000/");
        std::env::set_var("TRANSCRIPT_LANGUAGES", "de, en");
        std::env::set_var("YOUTUBE_API_KEY", "  ");
        std::env::set_var("TRANSCRIPT_DEMO_FALLBACK", "false");

        let config = TranscriptConfig::from_env();
        assert_eq!(config.backend_url, "http://backend:9000");
        assert_eq!(config.primary_language(), "de");
        assert!(config.youtube_api_key.is_none());
        assert!(!config.demo_fallback);

        for key in [
            "TRANSCRIPT_BACKEND_URL",
            "TRANSCRIPT_LANGUAGES",
            "YOUTUBE_API_KEY",
            "TRANSCRIPT_DEMO_FALLBACK",
        ] {
            std::env::remove_var(key);
        }
    }
}
