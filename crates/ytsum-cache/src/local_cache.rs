//! Per-video analysis cache.
//!
//! Stores `{transcript, summary, timestamp}` under `yt_demo_<videoId>`.
//! Entries expire 24 hours after they were written. Expiry is lazy: an
//! expired entry is deleted the next time it is read, nothing sweeps.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};
use ytsum_models::{CachedVideoData, TranscriptData};

use crate::clock::{Clock, SystemClock};
use crate::error::{CacheError, CacheResult};
use crate::store::{FileStore, KeyValueStore};

/// Prefix of every cache key.
pub const CACHE_KEY_PREFIX: &str = "yt_demo_";

/// Entry lifetime: 24 hours.
pub const CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Storage key for a video id.
///
/// Format: `yt_demo_{video_id}`
pub fn cache_key(video_id: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, video_id)
}

/// Platform cache directory for the file-backed store.
///
/// `~/.cache/ytsum` on Linux; falls back to the temp dir when the platform
/// has no cache directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ytsum")
}

/// Analysis cache keyed by video id.
#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
}

impl LocalCache {
    /// Create a cache over `store` using the system clock.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ttl_ms: CACHE_TTL_MS,
        }
    }

    /// File-backed cache under `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> CacheResult<Self> {
        Ok(Self::new(Arc::new(FileStore::open(dir)?)))
    }

    /// File-backed cache under [`default_cache_dir`].
    pub fn open_default() -> CacheResult<Self> {
        Self::open(default_cache_dir())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Load the entry for a video.
    ///
    /// Returns `Ok(None)` when nothing is stored or the entry has expired;
    /// expired entries are removed from the store. An entry that cannot be
    /// decoded is removed and reported as [`CacheError::Corrupt`].
    pub fn get(&self, video_id: &str) -> CacheResult<Option<CachedVideoData>> {
        let key = cache_key(video_id);

        let Some(raw) = self.store.get(&key)? else {
            debug!(key = %key, "Analysis cache miss");
            return Ok(None);
        };

        let entry: CachedVideoData = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(source) => {
                if let Err(e) = self.store.remove(&key) {
                    warn!(key = %key, error = %e, "Failed to remove corrupt cache entry");
                }
                return Err(CacheError::Corrupt { key, source });
            }
        };

        let now = self.clock.now_ms();
        if !entry.is_fresh(now, self.ttl_ms) {
            debug!(
                key = %key,
                age_ms = now - entry.timestamp,
                "Analysis cache entry expired"
            );
            self.store.remove(&key)?;
            return Ok(None);
        }

        debug!(key = %key, "Analysis cache hit");
        Ok(Some(entry))
    }

    /// Store a completed analysis, replacing any previous entry.
    pub fn set(&self, video_id: &str, transcript: &TranscriptData, summary: &str) -> CacheResult<()> {
        let key = cache_key(video_id);
        let entry = CachedVideoData::new(transcript.clone(), summary, self.clock.now_ms());
        let value = serde_json::to_string(&entry)?;

        self.store.set(&key, &value)?;

        debug!(
            key = %key,
            segments = transcript.segments.len(),
            summary_len = summary.len(),
            "Stored analysis in cache"
        );
        Ok(())
    }

    /// Whether a fresh entry exists. Read failures count as absent.
    pub fn has(&self, video_id: &str) -> bool {
        matches!(self.get(video_id), Ok(Some(_)))
    }

    /// Delete the entry for a video.
    pub fn remove(&self, video_id: &str) -> CacheResult<()> {
        self.store.remove(&cache_key(video_id))
    }

    /// Delete every analysis entry. Returns how many were removed.
    pub fn clear(&self) -> CacheResult<usize> {
        let keys = self.store.keys(CACHE_KEY_PREFIX)?;
        for key in &keys {
            self.store.remove(key)?;
        }
        Ok(keys.len())
    }
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("ttl_ms", &self.ttl_ms)
            .finish_non_exhaustive()
    }
}
