//! Normalized racing entities
//!
//! These are the shapes served to API consumers. Upstream racing payloads are
//! mapped into them at the client boundary; nothing here knows about the
//! upstream wire format.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds between a race's scheduled start and its end.
pub const RACE_DURATION_SECS: i64 = 30 * 60;

/// Seconds before the scheduled start at which betting closes.
pub const BETTING_CLOSE_OFFSET_SECS: i64 = 2 * 60;

/// Decimal places of the fixed-point odds used by the market contracts.
pub const ODDS_DECIMALS: u32 = 6;

/// Start, end and close times of a race as Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceTimes {
    pub start_unix: i64,
    pub end_unix: i64,
    pub close_unix: i64,
}

impl RaceTimes {
    /// Derive end and close from the scheduled start.
    pub fn from_start(start_unix: i64) -> Self {
        Self {
            start_unix,
            end_unix: start_unix + RACE_DURATION_SECS,
            close_unix: start_unix - BETTING_CLOSE_OFFSET_SECS,
        }
    }
}

/// A race meeting at one venue on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Meeting {
    /// Venue mnemonic, e.g. `DOO`
    pub id: String,
    /// Meeting name, uppercased
    pub name: String,
    /// Venue location, uppercased
    pub location: String,
    /// Race code: `R` (thoroughbred), `H` (harness) or `G` (greyhound)
    pub race_type: String,
    pub date: NaiveDate,
    /// Races in upstream order
    pub races: Vec<Race>,
}

/// A single race within a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Race {
    pub number: u32,
    pub name: String,
    /// Distance in metres
    pub distance: u32,
    pub status: String,
    pub start_unix: i64,
    pub end_unix: i64,
    pub close_unix: i64,
}

/// A runner in a race with its fixed win odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Runner {
    pub number: u32,
    pub name: String,
    pub barrier: u32,
    /// Scratched or vacant box
    pub vacant: bool,
    /// Decimal win odds, zero when no price is offered
    pub odds: f64,
    /// Win odds in contract fixed-point form (`odds * 10^6`)
    pub odds_scaled: u64,
    pub proposition_id: String,
}

/// Win odds for a single runner, without the runner's descriptive fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RunnerOdds {
    pub number: u32,
    pub odds: f64,
    pub odds_scaled: u64,
    pub proposition_id: String,
}

impl From<&Runner> for RunnerOdds {
    fn from(runner: &Runner) -> Self {
        Self {
            number: runner.number,
            odds: runner.odds,
            odds_scaled: runner.odds_scaled,
            proposition_id: runner.proposition_id.clone(),
        }
    }
}

/// Convert decimal odds to the contracts' fixed-point representation.
///
/// Negative and non-finite odds scale to zero.
pub fn scale_odds(odds: f64) -> u64 {
    if !odds.is_finite() || odds <= 0.0 {
        return 0;
    }
    (odds * 10f64.powi(ODDS_DECIMALS as i32)).round() as u64
}

/// Build the proposition identifier for a win bet on `runner`.
///
/// Format: `R{yyyymmdd}_{TRACK}_{race}_W{runner}`.
pub fn proposition_id(date: NaiveDate, track: &str, race: u32, runner: u32) -> String {
    format!(
        "R{}_{}_{}_W{}",
        date.format("%Y%m%d"),
        track.to_uppercase(),
        race,
        runner
    )
}

// ============================================================================
// RESPONSE PAYLOADS
// ============================================================================

/// Body of `/meetings` and `/meetings/{date}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MeetingsResponse {
    pub date: NaiveDate,
    pub meetings: Vec<Meeting>,
}

/// Signed body of `/runners/{track}/{race}/win`.
///
/// `nonce` and `timestamp` are generated per response and are not checked
/// by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RunnersPayload {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub nonce: Uuid,
    pub timestamp: i64,
    pub date: NaiveDate,
    pub track: String,
    pub race: u32,
    pub runners: Vec<Runner>,
}

/// Signed body of `/odds/{track}/{race}/win`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OddsPayload {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub nonce: Uuid,
    pub timestamp: i64,
    pub date: NaiveDate,
    pub track: String,
    pub race: u32,
    pub odds: Vec<RunnerOdds>,
}

impl RunnersPayload {
    pub fn new(date: NaiveDate, track: &str, race: u32, runners: Vec<Runner>, now: DateTime<Utc>) -> Self {
        Self {
            nonce: Uuid::new_v4(),
            timestamp: now.timestamp(),
            date,
            track: track.to_uppercase(),
            race,
            runners,
        }
    }
}

impl OddsPayload {
    pub fn new(date: NaiveDate, track: &str, race: u32, runners: &[Runner], now: DateTime<Utc>) -> Self {
        Self {
            nonce: Uuid::new_v4(),
            timestamp: now.timestamp(),
            date,
            track: track.to_uppercase(),
            race,
            odds: runners.iter().map(RunnerOdds::from).collect(),
        }
    }
}
