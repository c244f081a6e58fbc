//! Test-token faucet
//!
//! POST /faucet with `{ "to": "0x..." }` sends the configured amount of every
//! faucet token to `to`. Returns 503 when no faucet tokens are configured.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use paddock_core::{FaucetReceipt, FaucetRequest};

use crate::error::{ApiError, ApiResult};
use crate::routes::params::parse_account;
use crate::state::AppState;
use crate::telemetry::observe_upstream;

/// POST /faucet - Send faucet tokens
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/faucet",
    tag = "Faucet",
    request_body = FaucetRequest,
    responses(
        (status = 200, description = "One transfer per faucet token", body = FaucetReceipt),
        (status = 400, description = "Malformed body or address", body = crate::error::ApiError),
        (status = 502, description = "A transfer failed", body = crate::error::ApiError),
        (status = 503, description = "Faucet not configured", body = crate::error::ApiError),
    ),
))]
pub async fn drip(
    State(state): State<AppState>,
    payload: Result<Json<FaucetRequest>, JsonRejection>,
) -> ApiResult<Json<FaucetReceipt>> {
    let faucet = state
        .faucet
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Faucet is not configured"))?;

    let Json(request) = payload.map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;
    if request.to.trim().is_empty() {
        return Err(ApiError::missing_field("to"));
    }
    let to = parse_account(&request.to)?;

    tracing::info!(to = %request.to, "Faucet request");
    let receipt = observe_upstream("faucet", faucet.drip(to)).await?;
    Ok(Json(receipt))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/", post(drip))
}
