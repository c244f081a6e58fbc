//! Vaults
//!
//! - GET /vaults - vault addresses from the registry
//! - GET /vaults/performance - performance per vault, zero where a read fails
//! - GET /vaults/liquidity - total assets per vault and overall
//! - GET /vaults/{address} - one vault's ERC-4626 metadata

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use paddock_cache::CacheKey;
use paddock_chain::{checksum, liquidity, vault_performance_all};
use paddock_core::{AddressList, Liquidity, PaddockResult, RegistryKind, VaultDetails, VaultPerformanceList};

use crate::error::ApiResult;
use crate::routes::params::parse_account;
use crate::routes::{registry, CHAIN_SERVICE};
use crate::state::AppState;
use crate::telemetry::observe_upstream;

/// GET /vaults - Registered vault addresses
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/vaults",
    tag = "Protocol",
    responses(
        (status = 200, description = "Vault addresses in registry order", body = AddressList),
        (status = 502, description = "Chain read failed", body = crate::error::ApiError),
    ),
))]
pub async fn list_vaults(State(state): State<AppState>) -> ApiResult<Json<AddressList>> {
    Ok(Json(registry::listing(&state, RegistryKind::Vaults).await?))
}

/// GET /vaults/performance - Performance of every vault
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/vaults/performance",
    tag = "Protocol",
    responses(
        (status = 200, description = "Per-vault performance", body = VaultPerformanceList),
        (status = 502, description = "Vault listing failed", body = crate::error::ApiError),
    ),
))]
pub async fn performance(State(state): State<AppState>) -> ApiResult<Json<VaultPerformanceList>> {
    let state_ref = &state;
    let read = state
        .cached(&CacheKey::vault_performance(), move || load_performance(state_ref))
        .await?;
    Ok(Json(read.into_value()))
}

async fn load_performance(state: &AppState) -> PaddockResult<VaultPerformanceList> {
    let vaults = registry::addresses(state, RegistryKind::Vaults).await?;
    let vaults = observe_upstream(CHAIN_SERVICE, async {
        Ok(vault_performance_all(state.chain.as_ref(), &vaults).await)
    })
    .await?;
    Ok(VaultPerformanceList { vaults })
}

/// GET /vaults/liquidity - Total assets across vaults
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/vaults/liquidity",
    tag = "Protocol",
    responses(
        (status = 200, description = "Per-vault and total liquidity", body = Liquidity),
        (status = 502, description = "A vault read failed", body = crate::error::ApiError),
    ),
))]
pub async fn total_liquidity(State(state): State<AppState>) -> ApiResult<Json<Liquidity>> {
    let state_ref = &state;
    let read = state
        .cached(&CacheKey::vault_liquidity(), move || load_liquidity(state_ref))
        .await?;
    Ok(Json(read.into_value()))
}

async fn load_liquidity(state: &AppState) -> PaddockResult<Liquidity> {
    let vaults = registry::addresses(state, RegistryKind::Vaults).await?;
    observe_upstream(CHAIN_SERVICE, liquidity(state.chain.as_ref(), &vaults)).await
}

/// GET /vaults/{address} - Vault details
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/vaults/{address}",
    tag = "Protocol",
    params(
        ("address" = String, Path, description = "Vault contract address"),
    ),
    responses(
        (status = 200, description = "Vault details", body = VaultDetails),
        (status = 400, description = "Malformed address", body = crate::error::ApiError),
        (status = 502, description = "Chain read failed", body = crate::error::ApiError),
    ),
))]
pub async fn vault_details(State(state): State<AppState>, Path(address): Path<String>) -> ApiResult<Json<VaultDetails>> {
    let vault = parse_account(&address)?;
    let chain = state.chain.as_ref();
    let read = state
        .cached(&CacheKey::vault(&checksum(&vault)), move || {
            observe_upstream(CHAIN_SERVICE, chain.vault_details(vault))
        })
        .await?;
    Ok(Json(read.into_value()))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vaults))
        .route("/performance", get(performance))
        .route("/liquidity", get(total_liquidity))
        .route("/:address", get(vault_details))
}
