//! Rate limit decision model.

use serde::{Deserialize, Serialize};

/// Outcome of one rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// When the oldest counted request leaves the window, in epoch milliseconds.
    pub reset_at_ms: i64,
}

impl RateLimitResult {
    /// Decision used when no counter is available: allowed, zero counters.
    pub fn fail_open() -> Self {
        Self {
            allowed: true,
            limit: 0,
            remaining: 0,
            reset_at_ms: 0,
        }
    }

    /// Whether this decision came from a fail-open path.
    pub fn is_fail_open(&self) -> bool {
        self.allowed && self.limit == 0
    }

    /// Reset instant in Unix seconds, rounded up.
    pub fn reset_unix_secs(&self) -> i64 {
        (self.reset_at_ms.max(0) + 999) / 1000
    }

    /// Seconds a rejected caller should wait, never less than 1.
    pub fn retry_after_secs(&self, now_ms: i64) -> u64 {
        let wait_ms = (self.reset_at_ms - now_ms).max(0);
        (((wait_ms + 999) / 1000) as u64).max(1)
    }
}
