//! Tiered sliding-window rate limiter.
//!
//! This crate provides:
//! - Fixed rate limit tiers per route and subscription level
//! - Sliding-window counters in Redis (atomic Lua script) or in memory
//! - A fail-open limiter that never blocks when the counter is unavailable
//! - Caller identifier resolution from user id and proxy headers

pub mod error;
pub mod identifier;
pub mod limiter;
pub mod store;
pub mod tier;

pub use error::{LimitResult, RateLimitError};
pub use identifier::{resolve_identifier, UNKNOWN_IDENTIFIER};
pub use limiter::{rate_limit_key, RateLimiter};
pub use store::{MemoryWindowStore, RedisWindowStore, SlidingWindowStore, WindowHit};
pub use tier::{RateLimitTier, RouteKind, UserTier};
pub use ytsum_models::RateLimitResult;
