//! Bundled demo transcript.

use ytsum_models::{TranscriptData, TranscriptSegment};

/// Notice shown alongside demo content.
pub const DEMO_WARNING: &str = "We couldn't load the transcript for this video right now, \
so you're seeing a sample transcript instead. Please try again in a few minutes.";

/// (start secs, duration secs, text)
const DEMO_SEGMENTS: &[(f64, f64, &str)] = &[
    (0.0, 4.5, "Welcome to YouTube Summaries."),
    (4.5, 5.0, "Paste any YouTube link and we fetch the full transcript for you."),
    (9.5, 5.5, "While you read along, an AI summary is written in real time."),
    (15.0, 4.0, "Summaries highlight the key points and the main takeaways."),
    (19.0, 5.0, "You can ask follow-up questions about the video in the chat."),
    (24.0, 4.5, "Timestamps let you jump straight to the part that matters."),
    (28.5, 4.0, "Recent analyses are kept on your device for a day."),
    (32.5, 3.5, "Thanks for trying it out."),
];

/// Demo transcript labelled with the requested video id.
///
/// Flagged `is_demo` and carries [`DEMO_WARNING`].
pub fn demo_transcript(video_id: &str) -> TranscriptData {
    let segments = DEMO_SEGMENTS
        .iter()
        .map(|&(start, duration, text)| TranscriptSegment::new(text, start, duration))
        .collect();

    TranscriptData {
        is_demo: true,
        warning: Some(DEMO_WARNING.to_string()),
        ..TranscriptData::new(video_id, segments, false)
    }
}
