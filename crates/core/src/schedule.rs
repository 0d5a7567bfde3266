//! Update triggers.
//!
//! A trigger is either a fixed interval or a daily wall-clock time. Both kinds
//! resolve to a next fire instant in any time zone, so the scheduler can treat
//! them uniformly.

use chrono::{DateTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid time format: {0} (expected HH:MM)")]
    InvalidFormat(String),
    #[error("Time out of range: {0}")]
    OutOfRange(String),
}

/// Time of day in hours and minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DailyTime {
    hour: u8,
    minute: u8,
}

impl DailyTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ScheduleError> {
        if hour >= 24 || minute >= 60 {
            return Err(ScheduleError::OutOfRange(format!("{}:{:02}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl FromStr for DailyTime {
    type Err = ScheduleError;

    /// Accepts `H:MM` or `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ScheduleError::InvalidFormat(s.to_string());

        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let well_formed = (1..=2).contains(&hour.len())
            && minute.len() == 2
            && hour.bytes().all(|b| b.is_ascii_digit())
            && minute.bytes().all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(invalid());
        }

        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for DailyTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DailyTime> for String {
    fn from(time: DailyTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// When the update procedure should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Fixed period, measured from the previous fire.
    Every(Duration),
    /// Once a day at a local wall-clock time.
    DailyAt(DailyTime),
}

impl Trigger {
    /// Shortest allowed interval.
    pub const MIN_PERIOD: Duration = Duration::from_secs(1);
    /// Longest allowed interval (one year). Longer periods are clamped.
    pub const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

    /// First instant strictly after `after` at which this trigger fires.
    pub fn next_fire<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> DateTime<Tz> {
        match self {
            Trigger::Every(period) => {
                let period = (*period).clamp(Self::MIN_PERIOD, Self::MAX_PERIOD);
                let delta = TimeDelta::from_std(period).unwrap_or(TimeDelta::days(1));
                saturating_add(after, delta)
            }
            Trigger::DailyAt(time) => {
                let tz = after.timezone();
                let mut date = after.date_naive();
                // A wall-clock time can be skipped by a DST jump; look a few days ahead.
                for _ in 0..3 {
                    let candidate = date
                        .and_hms_opt(time.hour().into(), time.minute().into(), 0)
                        .and_then(|naive| tz.from_local_datetime(&naive).earliest());
                    if let Some(candidate) = candidate {
                        if candidate > *after {
                            return candidate;
                        }
                    }
                    date = match date.succ_opt() {
                        Some(next) => next,
                        None => break,
                    };
                }
                saturating_add(after, TimeDelta::days(1))
            }
        }
    }
}

/// `at + delta`, or `at` itself when that is past the representable range.
fn saturating_add<Tz: TimeZone>(at: &DateTime<Tz>, delta: TimeDelta) -> DateTime<Tz> {
    at.clone()
        .checked_add_signed(delta)
        .unwrap_or_else(|| at.clone())
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Every(period) => write!(f, "every {}s", period.as_secs()),
            Trigger::DailyAt(time) => write!(f, "daily at {}", time),
        }
    }
}
