//! Summary stream handler.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures_util::Stream;
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers::relay::relay_llm_stream;
use crate::middleware::user_id;
use crate::services::openrouter::summary_messages;
use crate::state::AppState;

/// Body of a summary request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Stream a markdown summary of a transcript.
pub async fn summarize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SummarizeRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let llm = state.llm()?;

    if request.transcript.trim().is_empty() {
        return Err(ApiError::bad_request("Transcript is required"));
    }

    info!(
        video_id = request.video_id.as_deref().unwrap_or("-"),
        user_id = user_id(&headers).or(request.user_id.as_deref()).unwrap_or("-"),
        transcript_len = request.transcript.len(),
        model = llm.model(),
        "Summarizing transcript"
    );

    let response = llm.stream(&summary_messages(&request.transcript)).await?;
    Ok(relay_llm_stream(response, state.config.max_stream_duration, "summary"))
}
