//! API middleware.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Response};
use axum::middleware::Next;
use axum::response::IntoResponse;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn, Span};
use uuid::Uuid;
use ytsum_models::{now_ms, RateLimitResult};
use ytsum_ratelimit::{resolve_identifier, RateLimitTier, RateLimiter, RouteKind};

use crate::error::ApiError;
use crate::metrics;
use crate::services::SubscriptionGate;
use crate::state::AppState;

/// Header carrying the authenticated user id, set by the auth proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Create CORS layer.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    use axum::http::{header, Method};

    let allowed_headers = [
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        header::ORIGIN,
        HeaderName::from_static(USER_ID_HEADER),
    ];

    // Rate limit state must be readable by the browser
    let exposed_headers = [
        header::CONTENT_TYPE,
        header::RETRY_AFTER,
        HeaderName::from_static(RATE_LIMIT_LIMIT_HEADER),
        HeaderName::from_static(RATE_LIMIT_REMAINING_HEADER),
        HeaderName::from_static(RATE_LIMIT_RESET_HEADER),
    ];

    let allowed_methods = [Method::GET, Method::POST, Method::OPTIONS];

    if origins.iter().any(|o| o == "*") {
        // Wildcard origin - no credentials allowed, can use Any
        CorsLayer::new()
            .allow_methods(allowed_methods)
            .allow_headers(Any)
            .expose_headers(exposed_headers)
            .allow_origin(Any)
            .max_age(std::time::Duration::from_secs(600))
    } else {
        // Explicit origins - credentials allowed BUT cannot use Any for headers
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_methods(allowed_methods)
            .allow_headers(allowed_headers)
            .expose_headers(exposed_headers)
            .allow_credentials(true)
            .allow_origin(origins)
            .max_age(std::time::Duration::from_secs(600))
    }
}

/// Security headers middleware.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Strict-Transport-Security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("camera=(), geolocation=(), microphone=(), payment=(), usb=()"),
    );
    headers.insert("X-Permitted-Cross-Domain-Policies", HeaderValue::from_static("none"));

    response
}

/// Request ID middleware.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    // Generate or extract request ID
    let request_id = request
        .headers()
        .get("X-Request-ID")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());
    Span::current().record("request_id", request_id.as_str());

    let mut response = next.run(request).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-ID", header_value);
    }

    response
}

/// Request logging middleware.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration = start.elapsed();

    // Skip health check logging
    if !matches!(uri.path(), "/health" | "/healthz" | "/ready" | "/metrics") {
        info!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

/// State for one rate limited route group.
#[derive(Clone)]
pub struct RateLimitContext {
    pub route: RouteKind,
    pub limiter: RateLimiter,
    pub subscriptions: Arc<dyn SubscriptionGate>,
}

impl RateLimitContext {
    pub fn new(state: &AppState, route: RouteKind) -> Self {
        Self {
            route,
            limiter: state.rate_limiter.clone(),
            subscriptions: Arc::clone(&state.subscriptions),
        }
    }
}

/// Authenticated user id injected by the auth proxy, if any.
pub fn user_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Tiered sliding-window rate limiting.
///
/// Adds `X-RateLimit-*` headers to every response of the group and rejects
/// over-limit callers with 429.
pub async fn rate_limit_middleware(
    State(ctx): State<RateLimitContext>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let headers = request.headers();
    let user = user_id(headers);
    let identifier = resolve_identifier(user, |name: &str| headers.get(name).and_then(|v| v.to_str().ok()));
    let user_tier = ctx.subscriptions.tier_for(user).await;
    let tier = RateLimitTier::for_route(ctx.route, user_tier);

    let decision = ctx.limiter.check(&identifier, tier).await;

    if !decision.allowed {
        let retry_after = decision.retry_after_secs(now_ms());
        warn!(
            identifier = %identifier,
            tier = tier.name(),
            retry_after,
            "Rate limit exceeded"
        );
        metrics::record_rate_limit_hit(tier.name());
        let mut response = ApiError::RateLimited { retry_after }.into_response();
        apply_rate_limit_headers(response.headers_mut(), &decision);
        return response;
    }

    let mut response = next.run(request).await;
    apply_rate_limit_headers(response.headers_mut(), &decision);
    response
}

fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitResult) {
    headers.insert(RATE_LIMIT_LIMIT_HEADER, HeaderValue::from(decision.limit));
    headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(decision.remaining));
    headers.insert(RATE_LIMIT_RESET_HEADER, HeaderValue::from(decision.reset_unix_secs()));
}
