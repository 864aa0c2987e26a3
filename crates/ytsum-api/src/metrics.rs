//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "ytsum_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "ytsum_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "ytsum_http_requests_in_flight";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "ytsum_rate_limit_hits_total";

    // Stream metrics
    pub const STREAMS_TOTAL: &str = "ytsum_streams_total";
    pub const STREAM_DURATION_SECONDS: &str = "ytsum_stream_duration_seconds";

    // Transcript proxy metrics
    pub const TRANSCRIPT_REQUESTS_TOTAL: &str = "ytsum_transcript_requests_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a rejected request.
pub fn record_rate_limit_hit(tier: &str) {
    let labels = [("tier", tier.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Record how a summary or chat stream ended.
///
/// `outcome` is one of `completed`, `failed`, `timeout`.
pub fn record_stream(kind: &str, outcome: &str, duration_secs: f64) {
    let labels = [("kind", kind.to_string()), ("outcome", outcome.to_string())];
    counter!(names::STREAMS_TOTAL, &labels).increment(1);
    histogram!(names::STREAM_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a transcript proxy or resolve request.
pub fn record_transcript_request(format: &str, outcome: &str) {
    let labels = [("format", format.to_string()), ("outcome", outcome.to_string())];
    counter!(names::TRANSCRIPT_REQUESTS_TOTAL, &labels).increment(1);
}

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").expect("valid uuid pattern")
});

static NUMERIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[0-9]+(/|$)").expect("valid numeric pattern"));

/// Sanitize path for metrics labels (remove IDs).
fn sanitize_path(path: &str) -> String {
    let path = UUID_SEGMENT.replace_all(path, ":id");
    let path = NUMERIC_SEGMENT.replace_all(&path, "/:id$1");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/api/v1/transcript"), "/api/v1/transcript");
        assert_eq!(
            sanitize_path("/api/requests/550e8400-e29b-41d4-a716-446655440000"),
            "/api/requests/:id"
        );
        assert_eq!(sanitize_path("/api/items/42/detail"), "/api/items/:id/detail");
    }
}
