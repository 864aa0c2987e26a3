//! Transcript retrieval.
//!
//! This crate provides a client for the external transcript backend and a
//! fetcher that resolves a YouTube URL or id to a transcript by walking an
//! ordered chain of strategies:
//!
//! 1. Backend timestamps (real timing)
//! 2. Backend captions (synthetic 2 second timing)
//! 3. Direct YouTube timedtext (search-adjacent chains only, needs an API key)
//! 4. Bundled demo transcript

pub mod client;
pub mod config;
pub mod demo;
pub mod error;
pub mod fetcher;
pub mod parse;
pub mod strategy;

pub use client::{RawTranscript, TranscriptBackendClient, TranscriptFormat};
pub use config::TranscriptConfig;
pub use demo::{demo_transcript, DEMO_WARNING};
pub use error::{TierError, TranscriptError, TranscriptResult};
pub use fetcher::TranscriptFetcher;
pub use strategy::{DirectYoutube, ProxyCaptions, ProxyTimestamps, TranscriptStrategy};
