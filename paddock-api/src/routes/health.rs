//! Health Check Endpoints
//!
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check
//! - /health/ready - Cache backend and RPC endpoint check

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use paddock_chain::ProtocolReader;
use serde::{Deserialize, Serialize};

use crate::state::{ApiCache, AppState};

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthDetails {
    pub cache: ComponentHealth,
    pub chain: ComponentHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_stats: Option<CacheStatsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn from_check<T>(result: &Result<T, String>, latency_ms: u64) -> Self {
        match result {
            Ok(_) => Self {
                status: HealthStatus::Healthy,
                latency_ms: Some(latency_ms),
                error: None,
            },
            Err(e) => Self {
                status: HealthStatus::Unhealthy,
                latency_ms: None,
                error: Some(e.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CacheStatsSummary {
    pub hits: u64,
    pub misses: u64,
    /// Zero for backends that do not track it
    pub entries: u64,
    pub hit_rate: f64,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping - Simple pong response
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses(
        (status = 200, description = "Service is responding", body = String),
    ),
))]
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is alive", body = HealthResponse),
    ),
))]
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness check
///
/// Unhealthy when the RPC endpoint is unreachable. A failing cache backend
/// only degrades the service, since reads fall through to upstream.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse),
        (status = 503, description = "Service is not ready", body = HealthResponse),
    ),
))]
pub async fn readiness(
    State(cache): State<Arc<ApiCache>>,
    State(chain): State<Arc<dyn ProtocolReader>>,
    State(start_time): State<Instant>,
) -> impl IntoResponse {
    let started = Instant::now();
    let cache_check = cache.ping().await.map_err(|e| e.to_string());
    let cache_health = ComponentHealth::from_check(&cache_check, started.elapsed().as_millis() as u64);

    let started = Instant::now();
    let chain_check = chain.block_number().await.map_err(|e| e.to_string());
    let chain_health = ComponentHealth::from_check(&chain_check, started.elapsed().as_millis() as u64);

    let cache_stats = match cache.stats().await {
        Ok(stats) => Some(CacheStatsSummary {
            hits: stats.hits,
            misses: stats.misses,
            entries: stats.entry_count,
            hit_rate: stats.hit_rate(),
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Cache stats unavailable");
            None
        }
    };

    let overall_status = match (cache_health.status, chain_health.status) {
        (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
        (HealthStatus::Unhealthy, _) => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    };

    let response = HealthResponse {
        status: overall_status,
        message: None,
        details: Some(HealthDetails {
            cache: cache_health,
            chain: chain_health,
            cache_stats,
            block_number: chain_check.ok(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: start_time.elapsed().as_secs(),
        }),
    };

    let status_code = if overall_status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}
