//! Projection of racing API payloads into Paddock's entities.
//!
//! Both mappers are pure: identical input always yields identical output,
//! and upstream ordering of meetings, races and runners is kept.

use chrono::{DateTime, NaiveDate};
use paddock_core::{proposition_id, scale_odds, Meeting, Race, RaceTimes, Runner, UpstreamError};

use crate::types::{MeetingsEnvelope, RaceEnvelope, RawMeeting, RawRace, RawRunner};
use crate::SERVICE;

fn malformed(reason: String) -> UpstreamError {
    UpstreamError::MalformedPayload {
        service: SERVICE.to_string(),
        reason,
    }
}

/// Map a meetings listing into normalized meetings.
pub fn map_meetings(raw: &MeetingsEnvelope) -> Result<Vec<Meeting>, UpstreamError> {
    raw.meetings
        .iter()
        .enumerate()
        .map(|(i, meeting)| map_meeting(meeting).map_err(|reason| malformed(format!("meetings[{}]: {}", i, reason))))
        .collect()
}

fn map_meeting(raw: &RawMeeting) -> Result<Meeting, String> {
    if raw.meeting_name.trim().is_empty() {
        return Err("meetingName is empty".to_string());
    }
    if raw.venue_mnemonic.trim().is_empty() {
        return Err("venueMnemonic is empty".to_string());
    }

    let races = raw
        .races
        .iter()
        .enumerate()
        .map(|(i, race)| map_race(race).map_err(|reason| format!("races[{}]: {}", i, reason)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Meeting {
        id: raw.venue_mnemonic.trim().to_uppercase(),
        name: raw.meeting_name.trim().to_uppercase(),
        location: raw.location.trim().to_uppercase(),
        race_type: raw.race_type.clone(),
        date: raw.meeting_date,
        races,
    })
}

fn map_race(raw: &RawRace) -> Result<Race, String> {
    if raw.race_number == 0 {
        return Err("raceNumber must be positive".to_string());
    }
    let start = DateTime::parse_from_rfc3339(&raw.race_start_time)
        .map_err(|e| format!("raceStartTime '{}' is not RFC 3339: {}", raw.race_start_time, e))?;
    let times = RaceTimes::from_start(start.timestamp());

    Ok(Race {
        number: raw.race_number,
        name: raw.race_name.clone(),
        distance: raw.race_distance,
        status: raw.race_status.clone(),
        start_unix: times.start_unix,
        end_unix: times.end_unix,
        close_unix: times.close_unix,
    })
}

/// Map a race's field into runners with win odds for `date`, `track` and `race`.
pub fn map_runners(
    raw: &RaceEnvelope,
    date: NaiveDate,
    track: &str,
    race: u32,
) -> Result<Vec<Runner>, UpstreamError> {
    raw.runners
        .iter()
        .enumerate()
        .map(|(i, runner)| {
            map_runner(runner, date, track, race)
                .map_err(|reason| malformed(format!("runners[{}]: {}", i, reason)))
        })
        .collect()
}

fn map_runner(raw: &RawRunner, date: NaiveDate, track: &str, race: u32) -> Result<Runner, String> {
    if raw.runner_number == 0 {
        return Err("runnerNumber must be positive".to_string());
    }

    let odds = raw
        .fixed_odds
        .as_ref()
        .and_then(|fixed| fixed.return_win)
        .unwrap_or(0.0);
    if !odds.is_finite() || odds < 0.0 {
        return Err(format!("returnWin {} is not a valid price", odds));
    }

    Ok(Runner {
        number: raw.runner_number,
        name: raw.runner_name.clone(),
        barrier: raw.barrier_number.unwrap_or(0),
        vacant: raw.vacant_flag,
        odds,
        odds_scaled: scale_odds(odds),
        proposition_id: proposition_id(date, track, race, raw.runner_number),
    })
}
