//! API error types.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use ytsum_transcript::TranscriptError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimited { retry_after: u64 },

    /// A required secret is missing; rendered as `{error, message, help}`.
    #[error("{error}: {message}")]
    NotConfigured {
        error: String,
        message: String,
        help: String,
    },

    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Upstream unavailable: {0}")]
    BadGateway(String),

    #[error("Upstream timed out")]
    GatewayTimeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::BadGateway(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The LLM gateway key is not set.
    pub fn llm_not_configured() -> Self {
        Self::NotConfigured {
            error: "AI service not configured".to_string(),
            message: "OPENROUTER_API_KEY is not set".to_string(),
            help: "Set OPENROUTER_API_KEY in the server environment to enable summaries and chat".to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            // Only error statuses are passed through
            ApiError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TranscriptError> for ApiError {
    fn from(e: TranscriptError) -> Self {
        match e {
            TranscriptError::InvalidInput(input) => {
                ApiError::BadRequest(format!("Could not find a YouTube video id in '{}'", input))
            }
            TranscriptError::Http { status, body } => ApiError::Upstream {
                status,
                message: if body.trim().is_empty() {
                    "Transcript backend error".to_string()
                } else {
                    body
                },
            },
            TranscriptError::Exhausted { video_id } => {
                ApiError::NotFound(format!("No transcript available for {}", video_id))
            }
            TranscriptError::Network(e) if e.is_timeout() => ApiError::GatewayTimeout,
            other => ApiError::BadGateway(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            ApiError::RateLimited { retry_after } => (
                status,
                [(header::RETRY_AFTER, retry_after.to_string())],
                Json(json!({ "error": "Too many requests", "retryAfter": retry_after })),
            )
                .into_response(),
            ApiError::NotConfigured { error, message, help } => (
                status,
                Json(json!({ "error": error, "message": message, "help": help })),
            )
                .into_response(),
            other => {
                // Don't expose internal error details in production
                let message = match &other {
                    ApiError::Internal(_)
                        if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" =>
                    {
                        "An internal error occurred".to_string()
                    }
                    ApiError::Upstream { message, .. } => message.clone(),
                    _ => other.to_string(),
                };
                (status, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::RateLimited { retry_after: 3 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::llm_not_configured().status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Upstream {
                status: 403,
                message: "quota".into()
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Upstream {
                status: 1000,
                message: "weird".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_upstream_success_status_becomes_bad_gateway() {
        for status in [200, 204, 302, 304, 99] {
            let err = ApiError::Upstream {
                status,
                message: "odd".into(),
            };
            assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY, "{}", status);
        }
        let err = ApiError::Upstream {
            status: 504,
            message: "slow".into(),
        };
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_transcript_error_mapping() {
        let err: ApiError = TranscriptError::invalid_input("nope").into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = TranscriptError::Http {
            status: 403,
            body: String::new(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err: ApiError = TranscriptError::Exhausted {
            video_id: "dQw4w9WgXcQ".into(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_rate_limited_response_headers() {
        let response = ApiError::RateLimited { retry_after: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }
}
