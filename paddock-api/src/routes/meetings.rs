//! Race meetings
//!
//! - GET /meetings - today's meetings (UTC date)
//! - GET /meetings/{date} - meetings for a `YYYY-MM-DD` date
//!
//! Meeting lists are cached per date under the meetings TTL.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use paddock_cache::CacheKey;
use paddock_core::MeetingsResponse;

use crate::error::ApiResult;
use crate::routes::params::parse_date;
use crate::state::AppState;
use crate::telemetry::observe_upstream;

/// GET /meetings - Meetings for today
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/meetings",
    tag = "Racing",
    responses(
        (status = 200, description = "Today's meetings", body = MeetingsResponse),
        (status = 502, description = "Racing API failed", body = crate::error::ApiError),
        (status = 504, description = "Racing API timed out", body = crate::error::ApiError),
    ),
))]
pub async fn today(State(state): State<AppState>) -> ApiResult<Json<MeetingsResponse>> {
    meetings_for(&state, Utc::now().date_naive()).await
}

/// GET /meetings/{date} - Meetings for a date
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/meetings/{date}",
    tag = "Racing",
    params(
        ("date" = String, Path, description = "Race day as YYYY-MM-DD", example = "2022-05-14"),
    ),
    responses(
        (status = 200, description = "Meetings for the date", body = MeetingsResponse),
        (status = 400, description = "Malformed date", body = crate::error::ApiError),
        (status = 502, description = "Racing API failed", body = crate::error::ApiError),
    ),
))]
pub async fn by_date(State(state): State<AppState>, Path(date): Path<String>) -> ApiResult<Json<MeetingsResponse>> {
    let date = parse_date(&date)?;
    meetings_for(&state, date).await
}

async fn meetings_for(state: &AppState, date: NaiveDate) -> ApiResult<Json<MeetingsResponse>> {
    let racing = Arc::clone(&state.racing);
    let read = state
        .cached(&CacheKey::meetings(date), || async move {
            observe_upstream(paddock_racing::SERVICE, racing.meetings(date)).await
        })
        .await?;

    tracing::debug!(%date, meetings = read.value().len(), cache_hit = read.was_cache_hit(), "Served meetings");
    Ok(Json(MeetingsResponse {
        date,
        meetings: read.into_value(),
    }))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(today))
        .route("/:date", get(by_date))
}
