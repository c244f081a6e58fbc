//! Request instrumentation: one `http_request` span, one metrics sample and
//! one completion log line per request.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::metrics;

static ADDRESS_SEGMENT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^0[xX][0-9a-fA-F]{40}$").ok());
static DATE_SEGMENT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok());

fn matches(pattern: &Lazy<Option<Regex>>, segment: &str) -> bool {
    pattern.as_ref().map(|re| re.is_match(segment)).unwrap_or(false)
}

/// Replace addresses, dates and numeric ids with placeholders so metric
/// labels stay low-cardinality. Used when the router did not match a route.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if matches(&ADDRESS_SEGMENT, segment) {
                "{address}"
            } else if matches(&DATE_SEGMENT, segment) {
                "{date}"
            } else if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Observability middleware for Axum.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| normalize_path(&path));

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %route,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Some(metrics) = metrics() {
        metrics.record_http_request(method.as_str(), &route, status.as_u16(), duration.as_secs_f64());
    }

    if status.is_server_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            "Request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_address() {
        assert_eq!(
            normalize_path("/markets/0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            "/markets/{address}"
        );
        assert_eq!(
            normalize_path("/history/0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"),
            "/history/{address}"
        );
    }

    #[test]
    fn test_normalize_path_date_and_race() {
        assert_eq!(normalize_path("/meetings/2022-05-14"), "/meetings/{date}");
        assert_eq!(normalize_path("/runners/DOO/3/win"), "/runners/DOO/{id}/win");
    }

    #[test]
    fn test_normalize_path_static() {
        assert_eq!(normalize_path("/vaults/performance"), "/vaults/performance");
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_normalize_path_short_hex_is_kept() {
        assert_eq!(normalize_path("/markets/0x1234"), "/markets/0x1234");
    }
}
