//! Ordered transcript fallback chain.

use std::sync::Arc;

use tracing::{info, warn};
use ytsum_models::{extract_video_id, TranscriptData, VideoMetadata};

use crate::client::TranscriptBackendClient;
use crate::config::TranscriptConfig;
use crate::demo::demo_transcript;
use crate::error::{TierError, TranscriptError, TranscriptResult};
use crate::strategy::{DirectYoutube, ProxyCaptions, ProxyTimestamps, TranscriptStrategy};

/// Resolves a URL or id to a transcript by trying each tier in order.
///
/// A tier failure is logged and the next tier is tried. A quota signal skips
/// straight to the demo transcript. Only when every tier fails and the demo
/// fallback is disabled does [`fetch`](Self::fetch) return an error.
#[derive(Clone)]
pub struct TranscriptFetcher {
    client: Arc<TranscriptBackendClient>,
    strategies: Vec<Arc<dyn TranscriptStrategy>>,
    demo_fallback: bool,
}

impl TranscriptFetcher {
    /// Core summary chain: backend timestamps, then backend captions.
    pub fn new(config: &TranscriptConfig) -> TranscriptResult<Self> {
        let client = Arc::new(TranscriptBackendClient::new(config)?);
        Ok(Self::from_client(client, config.demo_fallback))
    }

    /// Core chain over an existing backend client.
    pub fn from_client(client: Arc<TranscriptBackendClient>, demo_fallback: bool) -> Self {
        let strategies: Vec<Arc<dyn TranscriptStrategy>> = vec![
            Arc::new(ProxyTimestamps::new(client.clone())),
            Arc::new(ProxyCaptions::new(client.clone())),
        ];
        Self {
            client,
            strategies,
            demo_fallback,
        }
    }

    /// Search-adjacent chain: the core tiers plus direct YouTube when an API
    /// key is configured.
    pub fn with_direct_fallback(config: &TranscriptConfig) -> TranscriptResult<Self> {
        let fetcher = Self::new(config)?;
        Ok(match DirectYoutube::from_config(config) {
            Some(direct) => fetcher.push_strategy(Arc::new(direct)),
            None => fetcher,
        })
    }

    /// Append a tier to the end of the chain.
    pub fn push_strategy(mut self, strategy: Arc<dyn TranscriptStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Replace the whole chain.
    pub fn with_strategies(mut self, strategies: Vec<Arc<dyn TranscriptStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    /// Tier names in order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn client(&self) -> &Arc<TranscriptBackendClient> {
        &self.client
    }

    /// Resolve a YouTube URL or bare id to a transcript.
    pub async fn fetch(&self, video_url_or_id: &str) -> TranscriptResult<TranscriptData> {
        let video_id = extract_video_id(video_url_or_id)
            .ok_or_else(|| TranscriptError::invalid_input(video_url_or_id.trim()))?;
        self.fetch_by_id(&video_id).await
    }

    /// Walk the chain for an already validated id.
    pub async fn fetch_by_id(&self, video_id: &str) -> TranscriptResult<TranscriptData> {
        for strategy in &self.strategies {
            match strategy.try_fetch(video_id).await {
                Ok(data) if !data.is_empty() => {
                    info!(
                        video_id = %video_id,
                        tier = strategy.name(),
                        segments = data.segments.len(),
                        "Transcript fetched"
                    );
                    return Ok(data);
                }
                Ok(_) => {
                    warn!(video_id = %video_id, tier = strategy.name(), "Transcript tier returned no segments");
                }
                Err(TierError::QuotaExceeded(reason)) => {
                    warn!(
                        video_id = %video_id,
                        tier = strategy.name(),
                        reason = %reason,
                        "Transcript quota exceeded, skipping remaining tiers"
                    );
                    break;
                }
                Err(e) => {
                    warn!(video_id = %video_id, tier = strategy.name(), error = %e, "Transcript tier failed");
                }
            }
        }

        if self.demo_fallback {
            warn!(video_id = %video_id, "All transcript tiers failed, serving demo transcript");
            return Ok(demo_transcript(video_id));
        }

        Err(TranscriptError::Exhausted {
            video_id: video_id.to_string(),
        })
    }

    /// Video metadata from the backend.
    pub async fn fetch_metadata(&self, video_id: &str) -> TranscriptResult<VideoMetadata> {
        self.client.metadata(video_id).await
    }
}

impl std::fmt::Debug for TranscriptFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptFetcher")
            .field("strategies", &self.strategy_names())
            .field("demo_fallback", &self.demo_fallback)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DEMO_WARNING;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(backend: &MockServer) -> TranscriptConfig {
        TranscriptConfig::default().with_backend_url(backend.uri())
    }

    /// Tier that records calls and answers with a fixed outcome.
    struct CountingTier {
        calls: AtomicUsize,
        outcome: Result<(), TierError>,
    }

    impl CountingTier {
        fn new(outcome: Result<(), TierError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome,
            })
        }
    }

    #[async_trait::async_trait]
    impl TranscriptStrategy for CountingTier {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn try_fetch(&self, video_id: &str) -> Result<TranscriptData, TierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone().map(|_| {
                TranscriptData::new(
                    video_id,
                    vec![ytsum_models::TranscriptSegment::new("counted", 0.0, 2.0)],
                    false,
                )
            })
        }
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let backend = MockServer::start().await;
        let fetcher = TranscriptFetcher::new(&config_for(&backend)).unwrap();

        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, TranscriptError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_primary_tier_wins() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/transcript"))
            .and(query_param("format", "timestamps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"text": "a", "start": 0.0, "duration": 1.0}
            ])))
            .expect(1)
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(query_param("format", "captions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("unused"))
            .expect(0)
            .mount(&backend)
            .await;

        let fetcher = TranscriptFetcher::new(&config_for(&backend)).unwrap();
        let data = fetcher.fetch("https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert_eq!(data.video_id, "dQw4w9WgXcQ");
        assert!(!data.is_demo);
        assert_eq!(data.segments.len(), 1);
    }

    #[tokio::test]
    async fn test_falls_through_to_captions() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("format", "timestamps"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(query_param("format", "captions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("never gonna give you up"))
            .expect(1)
            .mount(&backend)
            .await;

        let fetcher = TranscriptFetcher::new(&config_for(&backend)).unwrap();
        let data = fetcher.fetch("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(data.segments.len(), 5);
        assert_eq!(data.segments[4].start, 8.0);
        assert!(!data.is_demo);
    }

    #[tokio::test]
    async fn test_quota_exceeded_short_circuits_to_demo() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("format", "timestamps"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota"))
            .expect(1)
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(query_param("format", "captions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("unused"))
            .expect(0)
            .mount(&backend)
            .await;

        let youtube = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&youtube)
            .await;

        let config = TranscriptConfig {
            youtube_api_key: Some("yt-key".to_string()),
            youtube_base_url: youtube.uri(),
            ..config_for(&backend)
        };
        let fetcher = TranscriptFetcher::with_direct_fallback(&config).unwrap();
        assert_eq!(
            fetcher.strategy_names(),
            vec!["proxy_timestamps", "proxy_captions", "direct_youtube"]
        );

        let data = fetcher.fetch("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await.unwrap();
        assert!(data.is_demo);
        assert_eq!(data.video_id, "dQw4w9WgXcQ");
        assert_eq!(data.warning.as_deref(), Some(DEMO_WARNING));

        youtube.verify().await;
        backend.verify().await;
    }

    #[tokio::test]
    async fn test_direct_tier_used_after_backend_failures() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&backend)
            .await;

        let youtube = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "events": [{"tStartMs": 0, "dDurationMs": 1000, "segs": [{"utf8": "direct"}]}]
            })))
            .expect(1)
            .mount(&youtube)
            .await;

        let config = TranscriptConfig {
            youtube_api_key: Some("yt-key".to_string()),
            youtube_base_url: youtube.uri(),
            ..config_for(&backend)
        };
        let data = TranscriptFetcher::with_direct_fallback(&config)
            .unwrap()
            .fetch("dQw4w9WgXcQ")
            .await
            .unwrap();
        assert_eq!(data.full_text(), "direct");
        assert!(!data.is_demo);
    }

    #[tokio::test]
    async fn test_core_chain_has_no_direct_tier() {
        let backend = MockServer::start().await;
        let config = TranscriptConfig {
            youtube_api_key: Some("yt-key".to_string()),
            ..config_for(&backend)
        };
        let fetcher = TranscriptFetcher::new(&config).unwrap();
        assert_eq!(fetcher.strategy_names(), vec!["proxy_timestamps", "proxy_captions"]);
    }

    #[tokio::test]
    async fn test_exhausted_without_demo() {
        let backend = MockServer::start().await;
        let failing = CountingTier::new(Err(TierError::Unavailable("down".into())));
        let empty = CountingTier::new(Err(TierError::Empty));

        let fetcher = TranscriptFetcher::new(&config_for(&backend))
            .unwrap()
            .with_strategies(vec![
                failing.clone() as Arc<dyn TranscriptStrategy>,
                empty.clone(),
            ])
            .with_demo_fallback(false);

        let err = fetcher.fetch("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, TranscriptError::Exhausted { ref video_id } if video_id == "dQw4w9WgXcQ"));
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(empty.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_quota_signal_skips_later_tiers() {
        let backend = MockServer::start().await;
        let quota = CountingTier::new(Err(TierError::QuotaExceeded("403".into())));
        let later = CountingTier::new(Ok(()));

        let fetcher = TranscriptFetcher::new(&config_for(&backend))
            .unwrap()
            .with_strategies(vec![quota.clone() as Arc<dyn TranscriptStrategy>, later.clone()]);

        let data = fetcher.fetch("dQw4w9WgXcQ").await.unwrap();
        assert!(data.is_demo);
        assert_eq!(quota.calls.load(Ordering::SeqCst), 1);
        assert_eq!(later.calls.load(Ordering::SeqCst), 0);
    }
}
