//! Health check handlers.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub transcript_backend: CheckStatus,
    pub llm: CheckStatus,
    pub rate_limiter: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn ok(latency_ms: Option<u64>) -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
            latency_ms,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
            latency_ms: None,
        }
    }

    fn disabled() -> Self {
        Self {
            status: "disabled".to_string(),
            error: None,
            latency_ms: None,
        }
    }
}

/// Readiness check endpoint (readiness).
///
/// Only the transcript backend is required; a missing LLM key or a disabled
/// limiter is reported but does not fail readiness.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let transcript_check = {
        let start = Instant::now();
        if state.transcripts.health_check().await {
            CheckStatus::ok(Some(start.elapsed().as_millis() as u64))
        } else {
            CheckStatus::error("transcript backend unreachable")
        }
    };

    let llm_check = if state.llm.is_some() {
        CheckStatus::ok(None)
    } else {
        CheckStatus::error("OPENROUTER_API_KEY is not set")
    };

    let limiter_check = if state.rate_limiter.is_enabled() {
        CheckStatus::ok(None)
    } else {
        CheckStatus::disabled()
    };

    let ready = transcript_check.status == "ok";
    let all_ok = ready && llm_check.status == "ok";

    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: ReadinessChecks {
            transcript_backend: transcript_check,
            llm: llm_check,
            rate_limiter: limiter_check,
        },
    };

    if ready {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
