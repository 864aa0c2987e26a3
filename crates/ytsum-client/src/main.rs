//! `ytsum` command line tool.

use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ytsum_cache::LocalCache;
use ytsum_client::{AnalysisPhase, AnalyzeOptions, ChatSession, ClientConfig, VideoAnalysisOrchestrator};
use ytsum_models::{extract_video_id, format_timestamp};
use ytsum_stream::{CancelHandle, ChatStreamer, StreamError, StreamObserver};
use ytsum_transcript::TranscriptFetcher;

#[derive(Parser)]
#[command(name = "ytsum")]
#[command(about = "Summarize YouTube videos and ask questions about their transcripts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a transcript and stream its summary
    Analyze {
        /// Video URL or id
        url: String,

        /// Ignore any cached analysis
        #[arg(long)]
        skip_cache: bool,

        /// Print the transcript with timestamps
        #[arg(long)]
        transcript: bool,
    },
    /// Ask a question about a video
    Ask {
        /// Video URL or id
        url: String,

        /// The question
        question: String,
    },
    /// Manage the local analysis cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove one video, or everything when no URL is given
    Clear {
        /// Video URL or id
        url: Option<String>,
    },
}

/// Writes streamed chunks straight to stdout.
struct PrintObserver;

impl StreamObserver for PrintObserver {
    fn on_chunk(&self, chunk: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "{}", chunk);
        let _ = stdout.flush();
    }

    fn on_complete(&self, _text: &str) {
        println!();
    }

    fn on_error(&self, error: &StreamError) {
        eprintln!("\n{}", error.user_message());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    match cli.command {
        Command::Analyze {
            url,
            skip_cache,
            transcript,
        } => analyze(&config, &url, skip_cache, transcript).await,
        Command::Ask { url, question } => ask(&config, &url, &question).await,
        Command::Cache {
            action: CacheAction::Clear { url },
        } => clear_cache(&config, url.as_deref()),
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ytsum=warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

async fn analyze(config: &ClientConfig, url: &str, skip_cache: bool, print_transcript: bool) -> Result<()> {
    let orchestrator = VideoAnalysisOrchestrator::from_config(config).context("Failed to set up analysis")?;

    let stopper = orchestrator.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, stopping summary");
            stopper.stop();
        }
    });

    let mut rx = orchestrator.subscribe();
    if !orchestrator.analyze(url, AnalyzeOptions { skip_cache }).await {
        ctrl_c.abort();
        let snapshot = orchestrator.snapshot();
        bail!(snapshot.error.unwrap_or_else(|| "Analysis failed".to_string()));
    }

    let snapshot = orchestrator.snapshot();
    if let Some(transcript) = &snapshot.transcript {
        if let Some(warning) = &transcript.warning {
            eprintln!("{}", warning);
        }
        if print_transcript {
            for segment in &transcript.segments {
                println!("[{}] {}", format_timestamp(segment.start), segment.text);
            }
            println!();
        }
    }

    // Echo streamed text as it grows.
    let mut printed = 0;
    let final_snapshot = loop {
        let current = rx.borrow_and_update().clone();
        if current.phase == AnalysisPhase::GeneratingSummary && current.summary.len() > printed {
            print!("{}", &current.summary[printed..]);
            std::io::stdout().flush().ok();
            printed = current.summary.len();
        }
        if current.phase.is_settled() && current.generation == snapshot.generation {
            break current;
        }
        if rx.changed().await.is_err() {
            break orchestrator.snapshot();
        }
    };
    ctrl_c.abort();

    if printed > 0 {
        println!();
    }

    match final_snapshot.phase {
        AnalysisPhase::SummaryComplete if printed == 0 => {
            if final_snapshot.from_cache {
                eprintln!("(cached)");
            }
            println!("{}", final_snapshot.summary);
        }
        AnalysisPhase::SummaryComplete => {}
        AnalysisPhase::SummaryStopped => eprintln!("Summary stopped."),
        _ => {
            let message = final_snapshot
                .error
                .unwrap_or_else(|| "Summary unavailable".to_string());
            warn!(phase = %final_snapshot.phase, "Summary did not complete");
            eprintln!("{}", message);
        }
    }

    Ok(())
}

async fn ask(config: &ClientConfig, url: &str, question: &str) -> Result<()> {
    let video_id = extract_video_id(url).context("Please enter a valid YouTube URL.")?;

    let cache = LocalCache::open(config.cache_dir.clone())?;
    let transcript = match cache.get(&video_id) {
        Ok(Some(entry)) => entry.transcript,
        other => {
            if let Err(e) = other {
                warn!(video_id = %video_id, error = %e, "Cache read failed");
            }
            TranscriptFetcher::new(&config.transcript)?
                .fetch_by_id(&video_id)
                .await
                .context("Could not fetch a transcript for this video.")?
        }
    };

    let session = ChatSession::new(ChatStreamer::new(&config.api_url)?, transcript.full_text());

    let cancel = CancelHandle::new();
    let canceller = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let reply = session.ask_with(question, &PrintObserver, cancel.signal()).await;
    ctrl_c.abort();

    let reply = reply?;
    if cancel.is_cancelled() {
        println!();
    }
    info!(chars = reply.content.len(), "Reply received");
    Ok(())
}

fn clear_cache(config: &ClientConfig, url: Option<&str>) -> Result<()> {
    let cache = LocalCache::open(config.cache_dir.clone())?;
    match url {
        Some(url) => {
            let video_id = extract_video_id(url).context("Please enter a valid YouTube URL.")?;
            cache.remove(&video_id)?;
            println!("Removed {} from the cache", video_id);
        }
        None => {
            let removed = cache.clear()?;
            println!("Removed {} cached analyses", removed);
        }
    }
    Ok(())
}
