//! Markets
//!
//! - GET /markets - market addresses from the registry
//! - GET /markets/{address} - one market's exposure and bet counts

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use paddock_cache::CacheKey;
use paddock_chain::checksum;
use paddock_core::{AddressList, MarketDetails, RegistryKind};

use crate::error::ApiResult;
use crate::routes::params::parse_account;
use crate::routes::{registry, CHAIN_SERVICE};
use crate::state::AppState;
use crate::telemetry::observe_upstream;

/// GET /markets - Registered market addresses
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/markets",
    tag = "Protocol",
    responses(
        (status = 200, description = "Market addresses in registry order", body = AddressList),
        (status = 502, description = "Chain read failed", body = crate::error::ApiError),
    ),
))]
pub async fn list_markets(State(state): State<AppState>) -> ApiResult<Json<AddressList>> {
    Ok(Json(registry::listing(&state, RegistryKind::Markets).await?))
}

/// GET /markets/{address} - Market details
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/markets/{address}",
    tag = "Protocol",
    params(
        ("address" = String, Path, description = "Market contract address"),
    ),
    responses(
        (status = 200, description = "Market details", body = MarketDetails),
        (status = 400, description = "Malformed address", body = crate::error::ApiError),
        (status = 502, description = "Chain read failed", body = crate::error::ApiError),
    ),
))]
pub async fn market_details(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<MarketDetails>> {
    let market = parse_account(&address)?;
    let chain = state.chain.as_ref();
    let read = state
        .cached(&CacheKey::market(&checksum(&market)), move || {
            observe_upstream(CHAIN_SERVICE, chain.market_details(market))
        })
        .await?;
    Ok(Json(read.into_value()))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_markets))
        .route("/:address", get(market_details))
}
