//! Fallback tiers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use ytsum_models::{segments_from_plain_text, TranscriptData};

use crate::client::TranscriptBackendClient;
use crate::config::TranscriptConfig;
use crate::error::{TierError, TranscriptError};
use crate::parse::parse_json3;

/// One tier of the transcript fallback chain.
#[async_trait]
pub trait TranscriptStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Try to produce a non-empty transcript for `video_id`.
    async fn try_fetch(&self, video_id: &str) -> Result<TranscriptData, TierError>;
}

// =============================================================================
// Backend tiers
// =============================================================================

/// Structured timestamps from the transcript backend.
pub struct ProxyTimestamps {
    client: Arc<TranscriptBackendClient>,
}

impl ProxyTimestamps {
    pub fn new(client: Arc<TranscriptBackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranscriptStrategy for ProxyTimestamps {
    fn name(&self) -> &'static str {
        "proxy_timestamps"
    }

    async fn try_fetch(&self, video_id: &str) -> Result<TranscriptData, TierError> {
        let segments = self.client.timestamps(video_id).await?;
        if segments.is_empty() {
            return Err(TierError::Empty);
        }
        Ok(TranscriptData::new(video_id, segments, false))
    }
}

/// Plain captions from the transcript backend with synthetic timing.
pub struct ProxyCaptions {
    client: Arc<TranscriptBackendClient>,
}

impl ProxyCaptions {
    pub fn new(client: Arc<TranscriptBackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranscriptStrategy for ProxyCaptions {
    fn name(&self) -> &'static str {
        "proxy_captions"
    }

    async fn try_fetch(&self, video_id: &str) -> Result<TranscriptData, TierError> {
        let text = self.client.captions(video_id).await?;
        let segments = segments_from_plain_text(&text);
        if segments.is_empty() {
            return Err(TierError::Empty);
        }
        // Caption text has no real timing; treat it as generated.
        Ok(TranscriptData::new(video_id, segments, true))
    }
}

// =============================================================================
// Direct YouTube tier
// =============================================================================

/// YouTube timedtext captions in `json3` format.
///
/// Only part of search-adjacent chains, and only when an API key is configured.
pub struct DirectYoutube {
    http: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl DirectYoutube {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            language: language.into(),
        }
    }

    /// Build from config; `None` when no API key is configured.
    pub fn from_config(config: &TranscriptConfig) -> Option<Self> {
        let key = config.youtube_api_key.as_deref()?;
        let http = Client::builder()
            .timeout(config.timeout.min(Duration::from_secs(15)))
            .build()
            .ok()?;
        Some(Self::new(
            http,
            &config.youtube_base_url,
            key,
            config.primary_language(),
        ))
    }
}

#[async_trait]
impl TranscriptStrategy for DirectYoutube {
    fn name(&self) -> &'static str {
        "direct_youtube"
    }

    async fn try_fetch(&self, video_id: &str) -> Result<TranscriptData, TierError> {
        let url = format!("{}/api/timedtext", self.base_url);
        let query = [
            ("v", video_id),
            ("lang", self.language.as_str()),
            ("fmt", "json3"),
            ("key", self.api_key.as_str()),
        ];

        debug!(video_id = %video_id, "Requesting YouTube timedtext");

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(TranscriptError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        // timedtext answers 200 with an empty body when no track exists
        let body = response.text().await.map_err(TranscriptError::from)?;
        if body.trim().is_empty() {
            return Err(TierError::Empty);
        }
        let value: Value = serde_json::from_str(&body).map_err(TranscriptError::from)?;

        let segments = parse_json3(&value);
        if segments.is_empty() {
            return Err(TierError::Empty);
        }

        let mut data = TranscriptData::new(video_id, segments, false);
        data.language_code = self.language.clone();
        if self.language != "en" {
            data.language = self.language.clone();
        }
        Ok(data)
    }
}
