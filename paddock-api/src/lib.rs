//! Paddock API - HTTP layer
//!
//! Serves normalized racing data and protocol reads through a shared
//! read-through cache, signs race payloads with the service key and exposes
//! the test-token faucet.

pub mod config;
pub mod error;
pub mod macros;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::{ApiConfig, CacheBackendKind, ChainSettings, ServiceConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::{ApiCache, AppState};
