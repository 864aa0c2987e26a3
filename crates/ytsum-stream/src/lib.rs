//! Streaming summaries over server-sent events.
//!
//! This crate provides:
//! - One incremental SSE parser shared by every streaming consumer
//! - A lazy, cancellable frame stream over any byte stream
//! - Summary and chat streamers with an observer contract
//! - Markdown cleanup for finished summaries

pub mod cancel;
pub mod error;
pub mod frames;
pub mod markdown;
pub mod parser;
pub mod payload;
pub mod streamer;

pub use cancel::{CancelHandle, CancelSignal};
pub use error::{StreamError, StreamResult};
pub use frames::sse_frames;
pub use markdown::clean_markdown_summary;
pub use parser::{SseFrame, SseParser};
pub use payload::{decode_payload, StreamEvent};
pub use streamer::{
    drive_stream, error_for_response, ChatRequest, ChatStreamer, NoopObserver, StreamObserver, StreamOutcome,
    SummaryRequest, SummaryStreamer,
};
