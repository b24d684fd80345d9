//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vox_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vox_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vox_http_requests_in_flight";

    // Generation metrics
    pub const GENERATIONS_TOTAL: &str = "vox_generations_total";
    pub const GENERATION_DURATION_SECONDS: &str = "vox_generation_duration_seconds";
    pub const POLL_ATTEMPTS: &str = "vox_poll_attempts";

    // Sweeper metrics
    pub const STALE_GENERATIONS_TOTAL: &str = "vox_stale_generations_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vox_rate_limit_hits_total";
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

/// Record a finished generation.
pub fn record_generation(provider: &str, outcome: &str, duration_secs: f64, attempts: u32) {
    let labels = [
        ("provider", provider.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::GENERATIONS_TOTAL, &labels).increment(1);
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
    histogram!(names::POLL_ATTEMPTS, &labels).record(attempts as f64);
}

/// Record a stale generation recovery.
pub fn record_stale_generation() {
    counter!(names::STALE_GENERATIONS_TOTAL).increment(1);
}

/// Record a rate limit hit.
pub fn record_rate_limit_hit(path: &str) {
    let labels = [("path", sanitize_path(path))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Replace record IDs in a path with placeholders so label cardinality stays
/// bounded.
fn sanitize_path(path: &str) -> String {
    let mut out = Vec::new();
    let mut previous = "";

    for segment in path.split('/') {
        let replaced = match previous {
            "clips" | "generations" => ":id",
            _ => segment,
        };
        previous = segment;
        out.push(replaced);
    }

    out.join("/")
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
