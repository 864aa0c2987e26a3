//! Application state.

use std::sync::Arc;

use ytsum_ratelimit::RateLimiter;
use ytsum_transcript::{TranscriptBackendClient, TranscriptFetcher};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::services::{OpenRouterClient, StaticSubscriptionGate, SubscriptionGate};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    /// Raw proxy to the transcript backend
    pub transcripts: Arc<TranscriptBackendClient>,
    /// Full fallback chain, including the direct YouTube tier
    pub resolver: Arc<TranscriptFetcher>,
    /// `None` when no gateway key is configured
    pub llm: Option<Arc<OpenRouterClient>>,
    pub rate_limiter: RateLimiter,
    pub subscriptions: Arc<dyn SubscriptionGate>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig, rate_limiter: RateLimiter) -> ApiResult<Self> {
        let transcripts = TranscriptBackendClient::new(&config.transcript)
            .map_err(|e| ApiError::internal(format!("Failed to create transcript client: {}", e)))?;
        let resolver = TranscriptFetcher::with_direct_fallback(&config.transcript)
            .map_err(|e| ApiError::internal(format!("Failed to create transcript resolver: {}", e)))?;
        let llm = OpenRouterClient::from_config(&config.openrouter)?.map(Arc::new);
        let subscriptions = Arc::new(StaticSubscriptionGate::new(config.pro_user_ids.clone()));

        Ok(Self {
            config,
            transcripts: Arc::new(transcripts),
            resolver: Arc::new(resolver),
            llm,
            rate_limiter,
            subscriptions,
        })
    }

    /// Replace the subscription lookup.
    pub fn with_subscriptions(mut self, gate: Arc<dyn SubscriptionGate>) -> Self {
        self.subscriptions = gate;
        self
    }

    /// The LLM client, or the 503 error explaining why there is none.
    pub fn llm(&self) -> ApiResult<&OpenRouterClient> {
        self.llm.as_deref().ok_or_else(ApiError::llm_not_configured)
    }
}
