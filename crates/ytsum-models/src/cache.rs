//! Cached analysis model.

use serde::{Deserialize, Serialize};

use crate::transcript::TranscriptData;

/// A completed analysis persisted per video id.
///
/// Serialized as `{transcript, summary, timestamp}` with `timestamp` in
/// milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedVideoData {
    pub transcript: TranscriptData,
    pub summary: String,
    pub timestamp: i64,
}

impl CachedVideoData {
    pub fn new(transcript: TranscriptData, summary: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            transcript,
            summary: summary.into(),
            timestamp: timestamp_ms,
        }
    }

    /// Whether the entry is still valid at `now_ms` for the given TTL.
    ///
    /// Valid while `now - timestamp < ttl`; an entry exactly `ttl` old is expired.
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms.saturating_sub(self.timestamp) < ttl_ms
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptSegment;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn entry(ts: i64) -> CachedVideoData {
        let transcript = TranscriptData::new(
            "dQw4w9WgXcQ",
            vec![TranscriptSegment::new("hello", 0.0, 2.0)],
            false,
        );
        CachedVideoData::new(transcript, "Point one.", ts)
    }

    #[test]
    fn test_is_fresh_boundaries() {
        let e = entry(1_000);
        assert!(e.is_fresh(1_000, DAY_MS));
        assert!(e.is_fresh(1_000 + DAY_MS - 1, DAY_MS));
        assert!(!e.is_fresh(1_000 + DAY_MS, DAY_MS));
        assert!(!e.is_fresh(1_000 + DAY_MS + 1, DAY_MS));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(entry(42)).unwrap();
        let obj = json.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["summary", "timestamp", "transcript"]);
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["transcript"]["videoId"], "dQw4w9WgXcQ");
    }

    #[test]
    fn test_now_ms_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_ms() > 1_577_836_800_000);
    }
}
