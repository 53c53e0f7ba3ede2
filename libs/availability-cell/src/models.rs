use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use shared_models::{PractitionerId, ValidationError};

/// One practitioner's opening intervals for one calendar date, as delivered
/// by the schedule feed. Times are still unvalidated strings here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScheduleEntry {
    #[serde(alias = "practitioner_id")]
    pub practitioner_id: PractitionerId,
    pub date: String, // YYYY-MM-DD
    pub intervals: Vec<RawInterval>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInterval {
    pub start: String, // HH:MM
    pub end: String,
}

impl RawInterval {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// Half-open opening interval `[start, end)` within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeInterval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyInterval {
                start: start.format("%H:%M").to_string(),
                end: end.format("%H:%M").to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn parse(raw: &RawInterval) -> Result<Self, ValidationError> {
        let start = parse_time_of_day(&raw.start)?;
        let end = parse_time_of_day(&raw.end)?;
        Self::new(start, end)
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Where an availability answer comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityMode {
    /// Consult the practitioner's per-date intervals; unknown means closed.
    #[default]
    PractitionerSchedule,
    /// Ignore practitioner and index, answer from the clinic's opening window.
    BusinessHours,
}

/// Counters collected while building an index from a raw feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub accepted_entries: usize,
    pub discarded_entries: usize,
    pub accepted_intervals: usize,
    pub dropped_intervals: usize,
}

/// Parses a strict 24h `HH:MM` time of day.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ValidationError> {
    let invalid = || ValidationError::InvalidTime(value.to_string());

    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[2] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit());
    if !well_formed {
        return Err(invalid());
    }

    let hour: u32 = value[0..2].parse().map_err(|_| invalid())?;
    let minute: u32 = value[3..5].parse().map_err(|_| invalid())?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Parses an ISO `YYYY-MM-DD` calendar date.
pub fn parse_schedule_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate(value.to_string());

    // chrono tolerates padding and single-digit fields, so pin the shape first
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !well_formed {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}
