//! Client side of the YouTube Summaries backend.
//!
//! This crate provides:
//! - The video analysis orchestrator (cache, transcript, summary stream)
//! - Chat sessions over a transcript
//! - The `ytsum` command line tool

pub mod chat;
pub mod config;
pub mod error;
pub mod orchestrator;

pub use chat::{ChatSession, CHAT_FALLBACK_MESSAGE};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use orchestrator::{AnalysisPhase, AnalysisSnapshot, AnalyzeOptions, VideoAnalysisOrchestrator};
