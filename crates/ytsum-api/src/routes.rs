//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use ytsum_ratelimit::RouteKind;

use crate::handlers::{chat, get_transcript, health, ready, resolve_transcript, summarize};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, RateLimitContext,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Streams are bounded by MAX_STREAM_DURATION_SECS, not the request timeout
    let summarize_routes = Router::new()
        .route("/api/summarize", post(summarize))
        .route("/api/v1/summarize", post(summarize))
        .layer(middleware::from_fn_with_state(
            RateLimitContext::new(&state, RouteKind::Summarize),
            rate_limit_middleware,
        ));

    let chat_routes = Router::new()
        .route("/api/v1/chat", post(chat))
        .layer(middleware::from_fn_with_state(
            RateLimitContext::new(&state, RouteKind::Chat),
            rate_limit_middleware,
        ));

    let transcript_routes = Router::new()
        .route("/api/v1/transcript", get(get_transcript))
        .route("/api/v1/transcript/resolve", get(resolve_transcript))
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(middleware::from_fn_with_state(
            RateLimitContext::new(&state, RouteKind::Search),
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(summarize_routes)
        .merge(chat_routes)
        .merge(transcript_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
