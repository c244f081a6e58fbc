//! Racing API wire types
//!
//! Only the fields Paddock projects are declared; everything else in the
//! upstream body is ignored.

use chrono::NaiveDate;
use serde::Deserialize;

// ============================================================================
// MEETINGS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MeetingsEnvelope {
    pub meetings: Vec<RawMeeting>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeeting {
    pub meeting_name: String,
    pub location: String,
    pub race_type: String,
    pub meeting_date: NaiveDate,
    pub venue_mnemonic: String,
    #[serde(default)]
    pub races: Vec<RawRace>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRace {
    pub race_number: u32,
    #[serde(default)]
    pub race_name: String,
    /// RFC 3339 start time
    pub race_start_time: String,
    pub race_status: String,
    #[serde(default)]
    pub race_distance: u32,
}

// ============================================================================
// RACE DETAIL
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceEnvelope {
    #[serde(default)]
    pub runners: Vec<RawRunner>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRunner {
    pub runner_name: String,
    pub runner_number: u32,
    #[serde(default)]
    pub barrier_number: Option<u32>,
    #[serde(default)]
    pub vacant_flag: bool,
    #[serde(default)]
    pub fixed_odds: Option<RawFixedOdds>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFixedOdds {
    #[serde(default)]
    pub return_win: Option<f64>,
    #[serde(default)]
    pub return_place: Option<f64>,
    #[serde(default)]
    pub betting_status: Option<String>,
}

// ============================================================================
// ERRORS
// ============================================================================

/// Error body the racing API returns alongside 4xx/5xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}
