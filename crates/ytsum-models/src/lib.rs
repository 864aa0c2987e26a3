//! Shared data models for the YouTube Summaries backend.
//!
//! This crate provides Serde-serializable types for:
//! - Transcripts and their segments
//! - Cached video analyses
//! - Rate limit decisions
//! - Chat messages
//! - YouTube video id extraction

pub mod cache;
pub mod chat;
pub mod rate_limit;
pub mod timestamp;
pub mod transcript;
pub mod utils;
pub mod video;

// Re-export common types
pub use cache::{now_ms, CachedVideoData};
pub use chat::{ChatMessage, ChatRole, ChatTurn};
pub use rate_limit::RateLimitResult;
pub use timestamp::{format_timestamp, parse_timestamp, parse_timestamped_line, TimestampError};
pub use transcript::{
    segments_from_plain_text, TranscriptData, TranscriptSegment, SYNTHETIC_SEGMENT_SECS,
};
pub use utils::{extract_video_id, watch_url};
pub use video::VideoMetadata;
