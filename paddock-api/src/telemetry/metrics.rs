//! Prometheus Metrics Definitions
//!
//! HTTP, cache and upstream metrics registered once in the default registry
//! and exposed on `/metrics`.

use std::future::Future;
use std::time::Instant;

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use paddock_core::PaddockResult;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Upstream call latency buckets (seconds). Chain scans run long.
const UPSTREAM_LATENCY_BUCKETS: &[f64] = &[0.010, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance - initialized on first use
pub static METRICS: Lazy<ApiResult<PaddockMetrics>> = Lazy::new(PaddockMetrics::new);

/// The registered metrics, or `None` if registration failed at startup.
pub fn metrics() -> Option<&'static PaddockMetrics> {
    METRICS.as_ref().ok()
}

/// Container for all Paddock metrics.
#[derive(Clone)]
pub struct PaddockMetrics {
    /// labels: method, path, status
    pub http_requests_total: CounterVec,

    /// labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// labels: namespace (cache category), outcome (hit/miss/error)
    pub cache_lookups_total: CounterVec,

    /// labels: service (racing/chain/faucet), status (ok/error)
    pub upstream_requests_total: CounterVec,

    /// labels: service
    pub upstream_request_duration_seconds: HistogramVec,
}

impl PaddockMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "paddock_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_failed("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "paddock_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("http_request_duration_seconds", e))?,

            cache_lookups_total: register_counter_vec!(
                "paddock_cache_lookups_total",
                "Cache lookups by category and outcome",
                &["namespace", "outcome"]
            )
            .map_err(|e| registration_failed("cache_lookups_total", e))?,

            upstream_requests_total: register_counter_vec!(
                "paddock_upstream_requests_total",
                "Calls to the racing API and the chain",
                &["service", "status"]
            )
            .map_err(|e| registration_failed("upstream_requests_total", e))?,

            upstream_request_duration_seconds: register_histogram_vec!(
                "paddock_upstream_request_duration_seconds",
                "Upstream call duration in seconds",
                &["service"],
                UPSTREAM_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("upstream_request_duration_seconds", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_cache_lookup(&self, namespace: &str, outcome: &str) {
        self.cache_lookups_total.with_label_values(&[namespace, outcome]).inc();
    }

    pub fn record_upstream(&self, service: &str, success: bool, duration_secs: f64) {
        let status = if success { "ok" } else { "error" };
        self.upstream_requests_total.with_label_values(&[service, status]).inc();
        self.upstream_request_duration_seconds
            .with_label_values(&[service])
            .observe(duration_secs);
    }
}

fn registration_failed(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

/// Run an upstream call, recording its outcome and latency under `service`.
pub async fn observe_upstream<T, Fut>(service: &str, call: Fut) -> PaddockResult<T>
where
    Fut: Future<Output = PaddockResult<T>>,
{
    let start = Instant::now();
    let result = call.await;
    if let Some(metrics) = metrics() {
        metrics.record_upstream(service, result.is_ok(), start.elapsed().as_secs_f64());
    }
    result
}

/// Handler for GET /metrics endpoint.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
))]
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddock_core::ChainError;

    fn registered() -> &'static PaddockMetrics {
        match METRICS.as_ref() {
            Ok(metrics) => metrics,
            Err(e) => panic!("Metrics init failed: {}", e.message),
        }
    }

    #[test]
    fn test_record_http_request() {
        let metrics = registered();
        let counter = metrics.http_requests_total.with_label_values(&["GET", "/test-path", "200"]);
        let before = counter.get();
        metrics.record_http_request("GET", "/test-path", 200, 0.01);
        assert_eq!(counter.get(), before + 1.0);
    }

    #[test]
    fn test_record_cache_lookup() {
        let metrics = registered();
        let hits = metrics.cache_lookups_total.with_label_values(&["test-ns", "hit"]);
        let before = hits.get();
        metrics.record_cache_lookup("test-ns", "hit");
        metrics.record_cache_lookup("test-ns", "miss");
        assert_eq!(hits.get(), before + 1.0);
    }

    #[tokio::test]
    async fn test_observe_upstream_records_outcome() {
        let metrics = registered();
        let errors = metrics.upstream_requests_total.with_label_values(&["test-svc", "error"]);
        let before = errors.get();

        let ok = observe_upstream("test-svc", async { Ok::<_, paddock_core::PaddockError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let failed: PaddockResult<u8> = observe_upstream("test-svc", async {
            Err(ChainError::Rpc {
                reason: "down".to_string(),
            }
            .into())
        })
        .await;
        assert!(failed.is_err());
        assert_eq!(errors.get(), before + 1.0);
    }
}
