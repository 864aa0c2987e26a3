//! Transcript proxy handlers.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};
use ytsum_models::{extract_video_id, TranscriptData};
use ytsum_transcript::TranscriptFormat;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Query of the raw transcript proxy.
#[derive(Debug, Deserialize)]
pub struct TranscriptQuery {
    /// Video id or URL
    pub video: Option<String>,
    pub languages: Option<String>,
    pub format: Option<String>,
}

/// Relay one transcript format from the backend, keeping its content type.
pub async fn get_transcript(
    State(state): State<AppState>,
    Query(query): Query<TranscriptQuery>,
) -> ApiResult<Response> {
    let video = query
        .video
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing 'video' query parameter"))?;
    let video_id =
        extract_video_id(video).ok_or_else(|| ApiError::bad_request(format!("Invalid YouTube video: {}", video)))?;

    let format: TranscriptFormat = match query.format.as_deref() {
        None | Some("") => TranscriptFormat::Captions,
        Some(f) => f
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Unsupported format '{}'", f)))?,
    };
    let languages = query.languages.as_deref().filter(|l| !l.trim().is_empty());

    match state.transcripts.fetch_raw(&video_id, format, languages).await {
        Ok(raw) => {
            metrics::record_transcript_request(format.as_str(), "ok");
            Ok(([(header::CONTENT_TYPE, raw.content_type)], raw.body).into_response())
        }
        Err(e) => {
            warn!(video_id = %video_id, format = %format, error = %e, "Transcript proxy failed");
            metrics::record_transcript_request(format.as_str(), "error");
            Err(e.into())
        }
    }
}

/// Query of the resolve route.
#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub url: Option<String>,
}

/// Resolve a URL or id through the full fallback chain.
pub async fn resolve_transcript(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> ApiResult<Json<TranscriptData>> {
    let url = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing 'url' query parameter"))?;

    match state.resolver.fetch(url).await {
        Ok(data) => {
            info!(
                video_id = %data.video_id,
                segments = data.segments.len(),
                is_demo = data.is_demo,
                "Resolved transcript"
            );
            metrics::record_transcript_request("resolve", if data.is_demo { "demo" } else { "ok" });
            Ok(Json(data))
        }
        Err(e) => {
            metrics::record_transcript_request("resolve", "error");
            Err(e.into())
        }
    }
}
