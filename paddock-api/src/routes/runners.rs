//! Runners and win odds for a race, signed by the service key.
//!
//! - GET /runners/{track}/{race}/win
//! - GET /odds/{track}/{race}/win
//!
//! The race itself is cached under the race TTL. Each response gets a fresh
//! nonce and timestamp and is signed per request, so signatures are never
//! served from the cache.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use paddock_cache::CacheKey;
use paddock_core::{OddsPayload, Runner, RunnersPayload, SignedEnvelope};

use crate::error::ApiResult;
use crate::routes::params::{parse_date, parse_race, parse_track, RaceQuery};
use crate::state::AppState;
use crate::telemetry::observe_upstream;

/// GET /runners/{track}/{race}/win - Signed runner list with win odds
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/runners/{track}/{race}/win",
    tag = "Racing",
    params(
        ("track" = String, Path, description = "Venue mnemonic", example = "DOO"),
        ("race" = u32, Path, description = "Race number", example = 3),
        RaceQuery,
    ),
    responses(
        (status = 200, description = "Signed runners", body = SignedEnvelope<RunnersPayload>),
        (status = 400, description = "Malformed track, race or date", body = crate::error::ApiError),
        (status = 404, description = "No such race", body = crate::error::ApiError),
        (status = 502, description = "Racing API failed", body = crate::error::ApiError),
    ),
))]
pub async fn runners(
    State(state): State<AppState>,
    Path((track, race)): Path<(String, String)>,
    Query(query): Query<RaceQuery>,
) -> ApiResult<Json<SignedEnvelope<RunnersPayload>>> {
    let (date, track, race) = race_params(&query, &track, &race)?;
    let runners = race_runners(&state, date, &track, race).await?;

    let payload = RunnersPayload::new(date, &track, race, runners, Utc::now());
    Ok(Json(state.signer.sign(payload)?))
}

/// GET /odds/{track}/{race}/win - Signed win odds only
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/odds/{track}/{race}/win",
    tag = "Racing",
    params(
        ("track" = String, Path, description = "Venue mnemonic", example = "DOO"),
        ("race" = u32, Path, description = "Race number", example = 3),
        RaceQuery,
    ),
    responses(
        (status = 200, description = "Signed win odds", body = SignedEnvelope<OddsPayload>),
        (status = 400, description = "Malformed track, race or date", body = crate::error::ApiError),
        (status = 404, description = "No such race", body = crate::error::ApiError),
        (status = 502, description = "Racing API failed", body = crate::error::ApiError),
    ),
))]
pub async fn odds(
    State(state): State<AppState>,
    Path((track, race)): Path<(String, String)>,
    Query(query): Query<RaceQuery>,
) -> ApiResult<Json<SignedEnvelope<OddsPayload>>> {
    let (date, track, race) = race_params(&query, &track, &race)?;
    let runners = race_runners(&state, date, &track, race).await?;

    let payload = OddsPayload::new(date, &track, race, &runners, Utc::now());
    Ok(Json(state.signer.sign(payload)?))
}

fn race_params(query: &RaceQuery, track: &str, race: &str) -> ApiResult<(NaiveDate, String, u32)> {
    let date = match query.date.as_deref() {
        Some(date) => parse_date(date)?,
        None => Utc::now().date_naive(),
    };
    Ok((date, parse_track(track)?, parse_race(race)?))
}

async fn race_runners(state: &AppState, date: NaiveDate, track: &str, race: u32) -> ApiResult<Vec<Runner>> {
    let racing = Arc::clone(&state.racing);
    let upstream_track = track.to_string();
    let read = state
        .cached(&CacheKey::race(date, track, race), || async move {
            observe_upstream(paddock_racing::SERVICE, racing.runners(date, &upstream_track, race)).await
        })
        .await?;
    Ok(read.into_value())
}

pub fn runners_router() -> Router<AppState> {
    Router::new().route("/:track/:race/win", get(runners))
}

pub fn odds_router() -> Router<AppState> {
    Router::new().route("/:track/:race/win", get(odds))
}
