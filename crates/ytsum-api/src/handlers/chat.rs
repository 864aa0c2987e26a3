//! Chat stream handler.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures_util::Stream;
use serde::Deserialize;
use tracing::info;
use ytsum_models::{ChatRole, ChatTurn};

use crate::error::{ApiError, ApiResult};
use crate::handlers::relay::relay_llm_stream;
use crate::services::openrouter::chat_messages;
use crate::state::AppState;

/// Body of a chat request.
#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    #[serde(default)]
    pub messages: Vec<ChatTurn>,
    #[serde(default)]
    pub transcript: String,
}

/// Stream an answer to the last user message, grounded in the transcript.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequestBody>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let llm = state.llm()?;

    if request.transcript.trim().is_empty() {
        return Err(ApiError::bad_request("Transcript is required"));
    }
    match request.messages.last() {
        Some(turn) if turn.role == ChatRole::User && !turn.content.trim().is_empty() => {}
        _ => return Err(ApiError::bad_request("Last message must be a non-empty user question")),
    }

    info!(turns = request.messages.len(), model = llm.model(), "Answering chat question");

    let response = llm.stream(&chat_messages(&request.transcript, &request.messages)).await?;
    Ok(relay_llm_stream(response, state.config.max_stream_duration, "chat"))
}
