//! Transcript models.

use serde::{Deserialize, Serialize};

/// Spacing used when captions carry no real timing.
pub const SYNTHETIC_SEGMENT_SECS: f64 = 2.0;

/// One timed piece of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    /// Start offset in seconds
    pub start: f64,
    /// Duration in seconds
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    /// End offset in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A complete transcript for one video.
///
/// Built once per successful fetch and replaced wholesale by the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptData {
    pub video_id: String,
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub segments: Vec<TranscriptSegment>,

    /// Set when the segments are bundled sample content, not the real video.
    #[serde(default)]
    pub is_demo: bool,

    /// User-facing notice that accompanies demo content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl TranscriptData {
    /// Create an English transcript from segments.
    pub fn new(video_id: impl Into<String>, segments: Vec<TranscriptSegment>, is_generated: bool) -> Self {
        Self {
            video_id: video_id.into(),
            language: "English".to_string(),
            language_code: "en".to_string(),
            is_generated,
            segments,
            is_demo: false,
            warning: None,
        }
    }

    /// Plain text of the transcript, segments joined by a single space.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Offset of the end of the last segment, in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.segments.iter().map(TranscriptSegment::end).fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Split plain captions into word segments with uniform pseudo-timing.
///
/// Word `i` starts at `i * 2` seconds and lasts 2 seconds. This is an
/// approximation for captions that carry no timing at all.
pub fn segments_from_plain_text(text: &str) -> Vec<TranscriptSegment> {
    text.split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            TranscriptSegment::new(word, i as f64 * SYNTHETIC_SEGMENT_SECS, SYNTHETIC_SEGMENT_SECS)
        })
        .collect()
}
