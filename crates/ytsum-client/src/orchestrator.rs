//! Video analysis orchestrator.
//!
//! Drives one analysis at a time: cache lookup, transcript fetch, then a
//! background summary stream. State is published as [`AnalysisSnapshot`]s
//! over a `watch` channel.
//!
//! Every analysis carries a generation number. Starting a new analysis
//! cancels the previous summary stream, and a task whose generation is no
//! longer current never writes to the snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use ytsum_cache::LocalCache;
use ytsum_models::{extract_video_id, TranscriptData};
use ytsum_stream::{
    clean_markdown_summary, CancelHandle, CancelSignal, StreamError, StreamObserver, StreamOutcome,
    SummaryRequest, SummaryStreamer,
};
use ytsum_transcript::TranscriptFetcher;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Shown when the input is not a recognisable YouTube URL or id.
pub const INVALID_URL_MESSAGE: &str = "Please enter a valid YouTube URL.";

/// Shown when no transcript tier succeeded.
pub const TRANSCRIPT_FAILED_MESSAGE: &str = "Could not fetch a transcript for this video.";

/// Shown when a summary stream completes without content.
pub const EMPTY_SUMMARY_MESSAGE: &str = "Failed to generate summary.";

/// Where an analysis currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisPhase {
    #[default]
    Idle,
    CheckingCache,
    FetchingTranscript,
    TranscriptReady,
    GeneratingSummary,
    SummaryComplete,
    /// Summary failed; the transcript is still usable
    SummaryUnavailable,
    /// Stopped by the user; the partial summary is kept
    SummaryStopped,
    /// No transcript could be obtained
    Error,
}

impl AnalysisPhase {
    /// True once nothing more will happen without user action.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Idle | Self::SummaryComplete | Self::SummaryUnavailable | Self::SummaryStopped | Self::Error
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CheckingCache => "checking_cache",
            Self::FetchingTranscript => "fetching_transcript",
            Self::TranscriptReady => "transcript_ready",
            Self::GeneratingSummary => "generating_summary",
            Self::SummaryComplete => "summary_complete",
            Self::SummaryUnavailable => "summary_unavailable",
            Self::SummaryStopped => "summary_stopped",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state of the current analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSnapshot {
    /// Analysis this snapshot belongs to
    pub generation: u64,
    pub phase: AnalysisPhase,
    pub video_id: Option<String>,
    pub transcript: Option<TranscriptData>,
    /// Streamed text while generating, cleaned text once complete
    pub summary: String,
    /// User-facing error message
    pub error: Option<String>,
    /// Transcript and summary came from the local cache
    pub from_cache: bool,
}

/// Options for [`VideoAnalysisOrchestrator::analyze`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    /// Bypass the cache lookup; the result is still written back
    pub skip_cache: bool,
}

/// Coordinates transcript retrieval, summary streaming and caching.
///
/// Cloning shares the same state.
#[derive(Clone)]
pub struct VideoAnalysisOrchestrator {
    fetcher: Arc<TranscriptFetcher>,
    streamer: SummaryStreamer,
    cache: LocalCache,
    user_id: Option<String>,
    state: Arc<watch::Sender<AnalysisSnapshot>>,
    generation: Arc<AtomicU64>,
    active: Arc<Mutex<Option<(u64, CancelHandle)>>>,
}

impl VideoAnalysisOrchestrator {
    pub fn new(fetcher: TranscriptFetcher, streamer: SummaryStreamer, cache: LocalCache) -> Self {
        let (tx, _rx) = watch::channel(AnalysisSnapshot::default());
        Self {
            fetcher: Arc::new(fetcher),
            streamer,
            cache,
            user_id: None,
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Build every collaborator from config.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let fetcher = TranscriptFetcher::new(&config.transcript)?;
        let streamer = SummaryStreamer::new(&config.api_url)?;
        let cache = LocalCache::open(config.cache_dir.clone())?;
        Ok(Self::new(fetcher, streamer, cache).with_user_id(config.user_id.clone()))
    }

    /// Forward this user id with summary requests.
    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<AnalysisSnapshot> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> AnalysisSnapshot {
        self.state.borrow().clone()
    }

    /// Analyze a YouTube URL or id.
    ///
    /// Returns true once a transcript is available. On a cache miss the
    /// summary keeps streaming in the background after this returns; use
    /// [`wait_for_summary`](Self::wait_for_summary) or
    /// [`subscribe`](Self::subscribe) to follow it.
    pub async fn analyze(&self, url: &str, options: AnalyzeOptions) -> bool {
        let Some(video_id) = extract_video_id(url) else {
            let generation = self.begin(None);
            self.update(generation, |s| {
                s.phase = AnalysisPhase::Error;
                s.error = Some(INVALID_URL_MESSAGE.to_string());
            });
            return false;
        };

        let generation = self.begin(Some(video_id.clone()));

        if !options.skip_cache {
            match self.cache.get(&video_id) {
                Ok(Some(entry)) => {
                    info!(video_id = %video_id, "Serving analysis from cache");
                    return self.update(generation, |s| {
                        s.phase = AnalysisPhase::SummaryComplete;
                        s.transcript = Some(entry.transcript);
                        s.summary = entry.summary;
                        s.from_cache = true;
                    });
                }
                Ok(None) => debug!(video_id = %video_id, "Cache miss"),
                Err(e) => warn!(video_id = %video_id, error = %e, "Cache read failed"),
            }
        }

        if !self.update(generation, |s| s.phase = AnalysisPhase::FetchingTranscript) {
            return false;
        }

        let transcript = match self.fetcher.fetch_by_id(&video_id).await {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "Transcript fetch failed");
                self.update(generation, |s| {
                    s.phase = AnalysisPhase::Error;
                    s.error = Some(TRANSCRIPT_FAILED_MESSAGE.to_string());
                });
                return false;
            }
        };

        let published = self.update(generation, |s| {
            s.phase = AnalysisPhase::TranscriptReady;
            s.transcript = Some(transcript.clone());
        });
        if !published {
            debug!(video_id = %video_id, generation, "Analysis superseded before transcript arrived");
            return false;
        }

        self.spawn_summary(generation, transcript)
    }

    /// Regenerate the summary for the current transcript.
    ///
    /// Returns false when there is no transcript yet.
    pub fn generate_summary(&self) -> bool {
        let Some(transcript) = self.state.borrow().transcript.clone() else {
            return false;
        };

        let generation = self.next_generation();
        self.cancel_active();
        let advanced = self.state.send_if_modified(|s| {
            if s.generation > generation {
                return false;
            }
            s.generation = generation;
            s.from_cache = false;
            true
        });
        if !advanced {
            return false;
        }

        self.spawn_summary(generation, transcript)
    }

    /// Stop the running summary stream, keeping what has arrived.
    ///
    /// Returns false when nothing was streaming.
    pub fn stop(&self) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        match active.as_ref() {
            Some((generation, handle)) => {
                info!(generation, "Stopping summary stream");
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Wait until the current analysis settles and return its final state.
    pub async fn wait_for_summary(&self) -> AnalysisSnapshot {
        let mut rx = self.state.subscribe();
        let result = match rx.wait_for(|s| s.phase.is_settled()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        result
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Start a new analysis, superseding the previous one.
    fn begin(&self, video_id: Option<String>) -> u64 {
        let generation = self.next_generation();
        self.cancel_active();
        self.state.send_if_modified(|s| {
            if s.generation > generation {
                return false;
            }
            *s = AnalysisSnapshot {
                generation,
                phase: AnalysisPhase::CheckingCache,
                video_id: video_id.clone(),
                ..Default::default()
            };
            true
        });
        generation
    }

    /// Apply `f` if `generation` is still current. Returns whether it was.
    fn update(&self, generation: u64, f: impl FnOnce(&mut AnalysisSnapshot)) -> bool {
        update_snapshot(&self.state, generation, f)
    }

    fn cancel_active(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((generation, handle)) = active.take() {
            debug!(generation, "Cancelling previous summary stream");
            handle.cancel();
        }
    }

    fn clear_active(&self, generation: u64) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(active.as_ref(), Some((g, _)) if *g == generation) {
            *active = None;
        }
    }

    /// Start streaming the summary for `generation`.
    ///
    /// Returns false without spawning when a newer generation has started.
    fn spawn_summary(&self, generation: u64, transcript: TranscriptData) -> bool {
        let handle = CancelHandle::new();
        let cancel = handle.signal();
        {
            let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
            // Checked under the lock: `begin` bumps the counter before it
            // takes the lock to cancel, so a newer generation is always seen here.
            let current = self.generation.load(Ordering::SeqCst);
            let newer_active = matches!(active.as_ref(), Some((g, _)) if *g > generation);
            if generation != current || newer_active {
                debug!(generation, current, "Summary superseded before it started");
                return false;
            }
            if let Some((previous_generation, previous)) = active.replace((generation, handle)) {
                debug!(generation = previous_generation, "Cancelling previous summary stream");
                previous.cancel();
            }
        }

        self.update(generation, |s| {
            s.phase = AnalysisPhase::GeneratingSummary;
            s.summary.clear();
            s.error = None;
        });

        let this = self.clone();
        tokio::spawn(async move {
            this.run_summary(generation, transcript, cancel).await;
        });
        true
    }

    async fn run_summary(self, generation: u64, transcript: TranscriptData, cancel: CancelSignal) {
        let request = SummaryRequest {
            transcript: transcript.full_text(),
            video_id: transcript.video_id.clone(),
            user_id: self.user_id.clone(),
        };
        let observer = SnapshotObserver {
            state: self.state.clone(),
            generation,
        };

        let outcome = self.streamer.stream(&request, &observer, cancel).await;
        self.clear_active(generation);

        match outcome {
            StreamOutcome::Completed(text) => {
                let summary = clean_markdown_summary(&text);
                if summary.is_empty() {
                    warn!(video_id = %transcript.video_id, "Summary stream completed without content");
                    self.update(generation, |s| {
                        s.phase = AnalysisPhase::SummaryUnavailable;
                        s.error = Some(EMPTY_SUMMARY_MESSAGE.to_string());
                    });
                    return;
                }

                let current = self.update(generation, |s| {
                    s.phase = AnalysisPhase::SummaryComplete;
                    s.summary = summary.clone();
                });
                if !current {
                    debug!(generation, "Discarding summary of superseded analysis");
                    return;
                }

                info!(
                    video_id = %transcript.video_id,
                    summary_len = summary.len(),
                    "Summary complete"
                );
                if transcript.is_demo {
                    debug!(video_id = %transcript.video_id, "Not caching demo transcript");
                } else if let Err(e) = self.cache.set(&transcript.video_id, &transcript, &summary) {
                    warn!(video_id = %transcript.video_id, error = %e, "Cache write failed");
                }
            }
            StreamOutcome::Cancelled { partial } => {
                debug!(generation, received = partial.len(), "Summary stream stopped");
                self.update(generation, |s| {
                    s.phase = AnalysisPhase::SummaryStopped;
                    s.summary = partial;
                });
            }
            StreamOutcome::Failed { partial, error } => {
                warn!(video_id = %transcript.video_id, error = %error, "Summary stream failed");
                self.update(generation, |s| {
                    s.phase = AnalysisPhase::SummaryUnavailable;
                    s.summary = partial;
                    s.error = Some(error.user_message().to_string());
                });
            }
        }
    }
}

impl std::fmt::Debug for VideoAnalysisOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoAnalysisOrchestrator")
            .field("streamer", &self.streamer)
            .field("user_id", &self.user_id)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

fn update_snapshot(
    state: &watch::Sender<AnalysisSnapshot>,
    generation: u64,
    f: impl FnOnce(&mut AnalysisSnapshot),
) -> bool {
    state.send_if_modified(|s| {
        if s.generation != generation {
            return false;
        }
        f(s);
        true
    })
}

/// Appends streamed chunks to the snapshot of one generation.
struct SnapshotObserver {
    state: Arc<watch::Sender<AnalysisSnapshot>>,
    generation: u64,
}

impl StreamObserver for SnapshotObserver {
    fn on_chunk(&self, chunk: &str) {
        update_snapshot(&self.state, self.generation, |s| s.summary.push_str(chunk));
    }

    fn on_complete(&self, _text: &str) {}

    fn on_error(&self, error: &StreamError) {
        debug!(generation = self.generation, error = %error, "Summary stream error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_phases() {
        assert!(AnalysisPhase::Idle.is_settled());
        assert!(AnalysisPhase::SummaryComplete.is_settled());
        assert!(AnalysisPhase::SummaryUnavailable.is_settled());
        assert!(AnalysisPhase::SummaryStopped.is_settled());
        assert!(AnalysisPhase::Error.is_settled());

        assert!(!AnalysisPhase::CheckingCache.is_settled());
        assert!(!AnalysisPhase::FetchingTranscript.is_settled());
        assert!(!AnalysisPhase::TranscriptReady.is_settled());
        assert!(!AnalysisPhase::GeneratingSummary.is_settled());
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let (tx, rx) = watch::channel(AnalysisSnapshot {
            generation: 2,
            ..Default::default()
        });

        assert!(!update_snapshot(&tx, 1, |s| s.summary.push_str("stale")));
        assert!(rx.borrow().summary.is_empty());

        assert!(update_snapshot(&tx, 2, |s| s.summary.push_str("fresh")));
        assert_eq!(rx.borrow().summary, "fresh");
    }

    fn idle_orchestrator() -> VideoAnalysisOrchestrator {
        use ytsum_cache::MemoryStore;
        use ytsum_transcript::TranscriptConfig;

        let fetcher = TranscriptFetcher::new(&TranscriptConfig::default()).unwrap();
        let streamer = SummaryStreamer::new("http://127.0.0.1:9").unwrap();
        VideoAnalysisOrchestrator::new(fetcher, streamer, LocalCache::new(Arc::new(MemoryStore::new())))
    }

    #[test]
    fn test_stale_summary_does_not_cancel_newer_stream() {
        let orchestrator = idle_orchestrator();
        let stale = orchestrator.next_generation();
        let current = orchestrator.next_generation();

        let running = CancelHandle::new();
        *orchestrator.active.lock().unwrap() = Some((current, running.clone()));

        let transcript = TranscriptData::new("dQw4w9WgXcQ", Vec::new(), false);
        assert!(!orchestrator.spawn_summary(stale, transcript));

        assert!(!running.is_cancelled());
        let active = orchestrator.active.lock().unwrap();
        assert!(matches!(active.as_ref(), Some((g, _)) if *g == current));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(AnalysisPhase::SummaryStopped.to_string(), "summary_stopped");
    }
}
