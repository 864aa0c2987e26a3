//! Time-boxed local cache of completed video analyses.
//!
//! This crate provides:
//! - A synchronous key-value store abstraction with file and memory backends
//! - A per-video analysis cache with lazy TTL expiry
//! - An injectable clock for deterministic expiry

pub mod clock;
pub mod error;
pub mod local_cache;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, CacheResult};
pub use local_cache::{cache_key, default_cache_dir, LocalCache, CACHE_KEY_PREFIX, CACHE_TTL_MS};
pub use store::{FileStore, KeyValueStore, MemoryStore};
