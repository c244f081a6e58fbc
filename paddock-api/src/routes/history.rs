//! Bet history from `Placed` events
//!
//! - GET /history - bets on every registered market
//! - GET /history/{account} - bets placed by one account

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use paddock_cache::CacheKey;
use paddock_chain::{bet_history, checksum, Address};
use paddock_core::{BetHistoryList, PaddockResult, RegistryKind};

use crate::error::ApiResult;
use crate::routes::params::parse_account;
use crate::routes::{registry, CHAIN_SERVICE};
use crate::state::AppState;
use crate::telemetry::observe_upstream;

/// GET /history - All placed bets
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/history",
    tag = "Protocol",
    responses(
        (status = 200, description = "Bets grouped by market, oldest first", body = BetHistoryList),
        (status = 502, description = "Chain read failed", body = crate::error::ApiError),
    ),
))]
pub async fn all_bets(State(state): State<AppState>) -> ApiResult<Json<BetHistoryList>> {
    let state_ref = &state;
    let read = state
        .cached(&CacheKey::history(None), move || load_history(state_ref, None))
        .await?;
    Ok(Json(read.into_value()))
}

/// GET /history/{account} - Bets placed by an account
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/history/{account}",
    tag = "Protocol",
    params(
        ("account" = String, Path, description = "Bettor address"),
    ),
    responses(
        (status = 200, description = "The account's bets", body = BetHistoryList),
        (status = 400, description = "Malformed address", body = crate::error::ApiError),
        (status = 502, description = "Chain read failed", body = crate::error::ApiError),
    ),
))]
pub async fn account_bets(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> ApiResult<Json<BetHistoryList>> {
    let owner = parse_account(&account)?;
    let key = CacheKey::history(Some(&checksum(&owner)));
    let state_ref = &state;
    let read = state
        .cached(&key, move || load_history(state_ref, Some(owner)))
        .await?;
    Ok(Json(read.into_value()))
}

async fn load_history(state: &AppState, owner: Option<Address>) -> PaddockResult<BetHistoryList> {
    let markets = registry::addresses(state, RegistryKind::Markets).await?;
    let results = observe_upstream(
        CHAIN_SERVICE,
        bet_history(state.chain.as_ref(), &markets, state.settings.history_from_block, owner),
    )
    .await?;
    Ok(BetHistoryList { results })
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(all_bets))
        .route("/:account", get(account_bets))
}
