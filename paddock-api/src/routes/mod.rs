//! REST API Routes Module
//!
//! Racing data (meetings, runners, odds), protocol reads (markets, vaults,
//! bet history), the faucet, health checks, metrics and API docs, behind a
//! CORS layer and the observability middleware.

pub mod faucet;
pub mod health;
pub mod history;
pub mod markets;
pub mod meetings;
pub mod params;
pub mod registry;
pub mod root;
pub mod runners;
pub mod vaults;

use std::time::Duration;

use axum::{
    http::{header, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

/// Service label for chain reads in logs and metrics.
pub const CHAIN_SERVICE: &str = "chain";

// ============================================================================
// OPENAPI ENDPOINTS
// ============================================================================

#[cfg(feature = "openapi")]
async fn openapi_json() -> impl axum::response::IntoResponse {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

#[cfg(feature = "openapi")]
async fn openapi_yaml() -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;

    match crate::openapi::ApiDoc::to_yaml() {
        Ok(yaml) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/yaml")], yaml),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Failed to generate YAML: {}", e),
        ),
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Build the complete router.
///
/// Execution order: CORS -> Observability -> Handler
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(root::greeting))
        .nest("/meetings", meetings::create_router())
        .nest("/runners", runners::runners_router())
        .nest("/odds", runners::odds_router())
        .nest("/markets", markets::create_router())
        .nest("/vaults", vaults::create_router())
        .nest("/history", history::create_router())
        .nest("/faucet", faucet::create_router())
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler));

    #[cfg(feature = "openapi")]
    {
        router = router
            .route("/openapi.json", get(openapi_json))
            .route("/openapi.yaml", get(openapi_yaml));
    }

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", crate::openapi::ApiDoc::openapi()));
    }

    router
        .with_state(state)
        .layer(from_fn(observability_middleware))
        .layer(build_cors_layer(api_config))
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// With no origins configured every origin is allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS: restricting origins");
        let origins: Vec<axum::http::HeaderValue> = config
            .cors_origins
            .iter()
            .filter(|origin| !origin.starts_with("*."))
            .filter_map(|origin| origin.parse().ok())
            .collect();

        let cors = if config.cors_origins.iter().any(|origin| origin.starts_with("*.")) {
            let config = config.clone();
            cors.allow_origin(tower_http::cors::AllowOrigin::predicate(move |origin, _| {
                origin.to_str().map(|o| config.is_origin_allowed(o)).unwrap_or(false)
            }))
        } else {
            cors.allow_origin(origins)
        };

        if config.cors_allow_credentials {
            cors.allow_credentials(true)
        } else {
            cors
        }
    }
}
