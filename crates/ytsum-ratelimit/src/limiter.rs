//! Fail-open rate limiter.

use std::sync::Arc;

use tracing::{debug, info, warn};
use ytsum_models::RateLimitResult;

use crate::store::{RedisWindowStore, SlidingWindowStore};
use crate::tier::RateLimitTier;

/// Counter key for an identifier in a tier.
///
/// Format: `ratelimit:{tier}:{identifier}`
pub fn rate_limit_key(tier: RateLimitTier, identifier: &str) -> String {
    format!("ratelimit:{}:{}", tier.name(), identifier)
}

/// Tiered limiter over an optional counter store.
///
/// Without a store, or when the store fails, every check is allowed with
/// zero counters. Availability wins over strict enforcement.
#[derive(Clone, Default)]
pub struct RateLimiter {
    store: Option<Arc<dyn SlidingWindowStore>>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn SlidingWindowStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Limiter that allows everything.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Build from `RATE_LIMIT_REDIS_URL` or `REDIS_URL`.
    ///
    /// Missing or invalid configuration yields a disabled limiter.
    pub fn from_env() -> Self {
        let url = std::env::var("RATE_LIMIT_REDIS_URL")
            .or_else(|_| std::env::var("REDIS_URL"))
            .ok()
            .filter(|u| !u.trim().is_empty());

        match url {
            Some(url) => Self::from_redis_url(&url),
            None => {
                info!("Rate limiting disabled: no Redis URL configured");
                Self::disabled()
            }
        }
    }

    /// Redis-backed limiter. An unparsable URL yields a disabled limiter.
    pub fn from_redis_url(url: &str) -> Self {
        match RedisWindowStore::new(url) {
            Ok(store) => Self::new(Arc::new(store)),
            Err(e) => {
                warn!(error = %e, "Invalid rate limit Redis URL, rate limiting disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Check and record one request for `identifier` in `tier`.
    pub async fn check(&self, identifier: &str, tier: RateLimitTier) -> RateLimitResult {
        self.check_at(identifier, tier, ytsum_models::now_ms()).await
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub async fn check_at(&self, identifier: &str, tier: RateLimitTier, now_ms: i64) -> RateLimitResult {
        let Some(store) = &self.store else {
            return RateLimitResult::fail_open();
        };

        let key = rate_limit_key(tier, identifier);
        let limit = tier.limit();
        let window_ms = tier.window_ms();

        match store.hit(&key, limit, window_ms, now_ms).await {
            Ok(hit) => {
                let result = RateLimitResult {
                    allowed: hit.allowed,
                    limit,
                    remaining: limit.saturating_sub(hit.count),
                    reset_at_ms: hit.oldest_ms + window_ms,
                };
                if !result.allowed {
                    debug!(key = %key, tier = %tier, "Rate limit exceeded");
                }
                result
            }
            Err(e) => {
                warn!(key = %key, tier = %tier, error = %e, "Rate limit store unavailable, failing open");
                RateLimitResult::fail_open()
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryWindowStore;
    use serial_test::serial;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_rate_limit_key() {
        assert_eq!(
            rate_limit_key(RateLimitTier::Chat, "ip:1.2.3.4"),
            "ratelimit:chat:ip:1.2.3.4"
        );
    }

    #[tokio::test]
    async fn test_disabled_limiter_always_allows() {
        let limiter = RateLimiter::disabled();
        for _ in 0..50 {
            let r = limiter.check("ip:1.2.3.4", RateLimitTier::BetaSignup).await;
            assert_eq!(r, RateLimitResult::fail_open());
        }
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_open() {
        let limiter = RateLimiter::from_redis_url("redis://127.0.0.1:1");
        assert!(limiter.is_enabled());

        for _ in 0..(RateLimitTier::BetaSignup.limit() * 3) {
            let r = limiter.check("ip:1.2.3.4", RateLimitTier::BetaSignup).await;
            assert!(r.allowed);
            assert_eq!(r.limit, 0);
            assert_eq!(r.remaining, 0);
        }
    }

    #[tokio::test]
    async fn test_counts_down_then_rejects() {
        let limiter = RateLimiter::new(Arc::new(MemoryWindowStore::new()));
        let tier = RateLimitTier::BetaSignup;

        for i in 0..5 {
            let r = limiter.check_at("user:u1", tier, NOW + i).await;
            assert!(r.allowed);
            assert_eq!(r.limit, 5);
            assert_eq!(r.remaining, 4 - i as u32);
            assert_eq!(r.reset_at_ms, NOW + tier.window_ms());
        }

        let rejected = limiter.check_at("user:u1", tier, NOW + 10).await;
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.retry_after_secs(NOW + 10), 3600);

        // Other identifiers are unaffected
        assert!(limiter.check_at("user:u2", tier, NOW + 10).await.allowed);
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = RateLimiter::new(Arc::new(MemoryWindowStore::new()));
        let tier = RateLimitTier::Chat;

        for i in 0..20 {
            assert!(limiter.check_at("ip:a", tier, NOW + i).await.allowed);
        }
        assert!(!limiter.check_at("ip:a", tier, NOW + 30_000).await.allowed);
        assert!(limiter.check_at("ip:a", tier, NOW + 60_000).await.allowed);
    }

    #[test]
    #[serial]
    fn test_from_env_without_url_is_disabled() {
        std::env::remove_var("RATE_LIMIT_REDIS_URL");
        std::env::remove_var("REDIS_URL");
        assert!(!RateLimiter::from_env().is_enabled());
    }

    #[test]
    #[serial]
    fn test_from_env_prefers_dedicated_url() {
        std::env::set_var("RATE_LIMIT_REDIS_URL", "redis://127.0.0.1:6390");
        std::env::set_var("REDIS_URL", "not-a-url");
        assert!(RateLimiter::from_env().is_enabled());

        std::env::remove_var("RATE_LIMIT_REDIS_URL");
        assert!(!RateLimiter::from_env().is_enabled());
        std::env::remove_var("REDIS_URL");
    }
}
