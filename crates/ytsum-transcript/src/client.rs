//! Transcript backend HTTP client.

use std::fmt;
use std::str::FromStr;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use ytsum_models::{TranscriptSegment, VideoMetadata};

use crate::config::TranscriptConfig;
use crate::error::{TranscriptError, TranscriptResult};
use crate::parse::parse_timestamp_entries;

/// Output formats of `GET /api/v1/transcript`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    /// Plain text captions
    Captions,
    /// JSON array of timed lines
    Timestamps,
    /// oEmbed-style video metadata
    Metadata,
}

impl TranscriptFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Captions => "captions",
            Self::Timestamps => "timestamps",
            Self::Metadata => "metadata",
        }
    }

    /// Content type the backend answers with.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Captions => "text/plain; charset=utf-8",
            Self::Timestamps | Self::Metadata => "application/json",
        }
    }
}

impl fmt::Display for TranscriptFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TranscriptFormat {
    type Err = TranscriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "captions" | "text" => Ok(Self::Captions),
            "timestamps" => Ok(Self::Timestamps),
            "metadata" => Ok(Self::Metadata),
            other => Err(TranscriptError::invalid_input(format!("format={}", other))),
        }
    }
}

/// Unparsed backend answer, as relayed by the API proxy.
#[derive(Debug, Clone)]
pub struct RawTranscript {
    pub content_type: String,
    pub body: String,
}

/// Client for the external transcript backend.
#[derive(Debug, Clone)]
pub struct TranscriptBackendClient {
    http: Client,
    base_url: String,
    languages: String,
}

impl TranscriptBackendClient {
    /// Create a new client.
    pub fn new(config: &TranscriptConfig) -> TranscriptResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(TranscriptError::Network)?;

        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            languages: config.languages.clone(),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> TranscriptResult<Self> {
        Self::new(&TranscriptConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one format for a video without interpreting the body.
    ///
    /// Non-success statuses become [`TranscriptError::Http`].
    pub async fn fetch_raw(
        &self,
        video_id: &str,
        format: TranscriptFormat,
        languages: Option<&str>,
    ) -> TranscriptResult<RawTranscript> {
        let url = format!("{}/api/v1/transcript", self.base_url);
        let mut query = vec![("video", video_id), ("format", format.as_str())];
        if format != TranscriptFormat::Metadata {
            query.push(("languages", languages.unwrap_or(&self.languages)));
        }

        debug!(video_id = %video_id, format = %format, "Requesting transcript backend");

        let response = self.http.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(format.content_type())
            .to_string();
        let body = response.text().await?;

        Ok(RawTranscript { content_type, body })
    }

    /// Timed segments from the `timestamps` format.
    pub async fn timestamps(&self, video_id: &str) -> TranscriptResult<Vec<TranscriptSegment>> {
        let raw = self.fetch_raw(video_id, TranscriptFormat::Timestamps, None).await?;
        let value: Value = serde_json::from_str(&raw.body)?;
        parse_timestamp_entries(&value)
    }

    /// Plain caption text from the `captions` format.
    pub async fn captions(&self, video_id: &str) -> TranscriptResult<String> {
        let raw = self.fetch_raw(video_id, TranscriptFormat::Captions, None).await?;
        Ok(raw.body)
    }

    /// Video metadata.
    pub async fn metadata(&self, video_id: &str) -> TranscriptResult<VideoMetadata> {
        let raw = self.fetch_raw(video_id, TranscriptFormat::Metadata, None).await?;
        Ok(serde_json::from_str(&raw.body)?)
    }

    /// Whether the backend answers its health check.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Transcript backend health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TranscriptBackendClient {
        TranscriptBackendClient::new(&TranscriptConfig::default().with_backend_url(server.uri())).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("captions".parse::<TranscriptFormat>().unwrap(), TranscriptFormat::Captions);
        assert_eq!("TIMESTAMPS".parse::<TranscriptFormat>().unwrap(), TranscriptFormat::Timestamps);
        assert_eq!("metadata".parse::<TranscriptFormat>().unwrap(), TranscriptFormat::Metadata);
        assert!("srt".parse::<TranscriptFormat>().is_err());
    }

    #[tokio::test]
    async fn test_timestamps_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/transcript"))
            .and(query_param("video", "dQw4w9WgXcQ"))
            .and(query_param("languages", "en"))
            .and(query_param("format", "timestamps"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!(["0:00 - intro", "0:05 - verse"])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let segments = client_for(&server).timestamps("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].duration, 5.0);
    }

    #[tokio::test]
    async fn test_captions_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/transcript"))
            .and(query_param("format", "captions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("never gonna give"))
            .mount(&server)
            .await;

        let text = client_for(&server).captions("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(text, "never gonna give");
    }

    #[tokio::test]
    async fn test_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/transcript"))
            .and(query_param("format", "metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Never Gonna Give You Up",
                "author_name": "Rick Astley",
                "author_url": "https://www.youtube.com/@RickAstleyYT",
                "thumbnail_url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
            })))
            .mount(&server)
            .await;

        let meta = client_for(&server).metadata("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(meta.title, "Never Gonna Give You Up");
    }

    #[tokio::test]
    async fn test_http_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let err = client_for(&server).captions("dQw4w9WgXcQ").await.unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(matches!(err, TranscriptError::Http { status: 403, ref body } if body == "quota exceeded"));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(client_for(&server).health_check().await);
    }
}
