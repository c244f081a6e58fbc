//! Path and query parameter parsing shared by the route handlers.
//!
//! Parameters are taken as strings and parsed here so malformed input gets
//! the JSON error body instead of axum's plain-text rejection.

use chrono::NaiveDate;
use paddock_chain::{parse_address, Address};
use paddock_core::ValidationError;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Query string accepted by the race endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct RaceQuery {
    /// Race day as `YYYY-MM-DD`; defaults to today (UTC).
    pub date: Option<String>,
}

pub fn parse_date(value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ApiError::invalid_format("date", "YYYY-MM-DD"))
}

/// Venue mnemonic, uppercased.
pub fn parse_track(value: &str) -> ApiResult<String> {
    let track = value.trim();
    if track.is_empty() || track.len() > 10 || !track.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidValue {
            field: "track".to_string(),
            reason: "expected an alphanumeric venue mnemonic such as DOO".to_string(),
        }
        .into());
    }
    Ok(track.to_uppercase())
}

pub fn parse_race(value: &str) -> ApiResult<u32> {
    match value.trim().parse::<u32>() {
        Ok(race) if race > 0 => Ok(race),
        _ => Err(ValidationError::InvalidValue {
            field: "race".to_string(),
            reason: "expected a race number starting at 1".to_string(),
        }
        .into()),
    }
}

pub fn parse_account(value: &str) -> ApiResult<Address> {
    Ok(parse_address(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2022-05-14").unwrap(), NaiveDate::from_ymd_opt(2022, 5, 14).unwrap());
        assert_eq!(parse_date("14-05-2022").unwrap_err().code, ErrorCode::InvalidFormat);
        assert!(parse_date("2022-02-30").is_err());
    }

    #[test]
    fn test_parse_track_uppercases() {
        assert_eq!(parse_track("doo").unwrap(), "DOO");
        assert!(parse_track("").is_err());
        assert!(parse_track("DO O").is_err());
        assert!(parse_track("../etc").is_err());
    }

    #[test]
    fn test_parse_race() {
        assert_eq!(parse_race("3").unwrap(), 3);
        assert_eq!(parse_race("0").unwrap_err().code, ErrorCode::InvalidInput);
        assert!(parse_race("-1").is_err());
        assert!(parse_race("three").is_err());
    }

    #[test]
    fn test_parse_account() {
        assert!(parse_account("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").is_ok());
        assert_eq!(parse_account("0x1234").unwrap_err().code, ErrorCode::InvalidFormat);
    }
}
