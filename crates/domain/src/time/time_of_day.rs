//! Wall-clock time of day without a date.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use chrono::{NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

use super::ZonedDateTime;
use crate::error::{TickHubError, UnsupportedError, UsageError};

const SECONDS_PER_DAY: i64 = 86_400;

/// A time of day (`hour:minute:second`), totally ordered by its fields.
///
/// Values are immutable: arithmetic returns a new value wrapped around
/// midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
    second: u32,
}

impl TimeOfDay {
    /// Build a time of day from explicit fields.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::OutOfRange`] when a field exceeds its range.
    pub fn new(hour: u32, minute: u32, second: u32) -> Result<Self, TickHubError> {
        check_range("hour", hour, 23)?;
        check_range("minute", minute, 59)?;
        check_range("second", second, 59)?;
        Ok(Self {
            hour,
            minute,
            second,
        })
    }

    #[must_use]
    pub const fn midnight() -> Self {
        Self {
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    #[must_use]
    pub const fn noon() -> Self {
        Self {
            hour: 12,
            minute: 0,
            second: 0,
        }
    }

    /// Parse a strict `HH:MM` or `HH:MM:SS` string.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedError::TimeFormat`] when the input is not
    /// zero-padded, has the wrong number of fields, or is out of range.
    pub fn parse(input: &str) -> Result<Self, TickHubError> {
        let unsupported = || UnsupportedError::TimeFormat(input.to_string());
        let (hour, minute, second) = super::split_clock(input).ok_or_else(unsupported)?;
        Self::new(hour, minute, second).map_err(|_| unsupported().into())
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.hour
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.minute
    }

    #[must_use]
    pub fn second(self) -> u32 {
        self.second
    }

    /// Project the time of day out of a zoned timestamp, in its own offset.
    #[must_use]
    pub fn from_zoned(ts: &ZonedDateTime) -> Self {
        Self::from(ts.naive_time())
    }

    /// Whether `self` lies in `[start, end)`.
    ///
    /// When `start > end` the range wraps past midnight (e.g. `22:00..06:00`).
    #[must_use]
    pub fn between(self, start: Self, end: Self) -> bool {
        if start <= end {
            self >= start && self < end
        } else {
            self >= start || self < end
        }
    }

    #[must_use]
    pub fn seconds_from_midnight(self) -> u32 {
        self.hour * 3600 + self.minute * 60 + self.second
    }

    #[must_use]
    pub fn to_naive(self) -> NaiveTime {
        NaiveTime::MIN + TimeDelta::seconds(i64::from(self.seconds_from_midnight()))
    }

    fn from_seconds_wrapping(seconds: i64) -> Self {
        let secs = u32::try_from(seconds.rem_euclid(SECONDS_PER_DAY)).unwrap_or_default();
        Self {
            hour: secs / 3600,
            minute: secs % 3600 / 60,
            second: secs % 60,
        }
    }
}

fn check_range(field: &'static str, value: u32, max: u32) -> Result<(), UsageError> {
    if value > max {
        return Err(UsageError::OutOfRange { field, value, max });
    }
    Ok(())
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
        }
    }
}

impl From<&ZonedDateTime> for TimeOfDay {
    fn from(ts: &ZonedDateTime) -> Self {
        Self::from_zoned(ts)
    }
}

impl Add<TimeDelta> for TimeOfDay {
    type Output = Self;

    fn add(self, rhs: TimeDelta) -> Self {
        Self::from_seconds_wrapping(i64::from(self.seconds_from_midnight()) + rhs.num_seconds())
    }
}

impl Sub<TimeDelta> for TimeOfDay {
    type Output = Self;

    fn sub(self, rhs: TimeDelta) -> Self {
        Self::from_seconds_wrapping(i64::from(self.seconds_from_midnight()) - rhs.num_seconds())
    }
}

/// Forward distance from `rhs` to `self`, wrapping past midnight.
impl Sub for TimeOfDay {
    type Output = TimeDelta;

    fn sub(self, rhs: Self) -> TimeDelta {
        let diff = i64::from(self.seconds_from_midnight()) - i64::from(rhs.seconds_from_midnight());
        TimeDelta::seconds(diff.rem_euclid(SECONDS_PER_DAY))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl FromStr for TimeOfDay {
    type Err = TickHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = TickHubError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tod(h: u32, m: u32, s: u32) -> TimeOfDay {
        TimeOfDay::new(h, m, s).unwrap()
    }

    #[test]
    fn should_parse_hours_and_minutes() {
        assert_eq!(TimeOfDay::parse("09:05").unwrap(), tod(9, 5, 0));
    }

    #[test]
    fn should_parse_hours_minutes_and_seconds() {
        assert_eq!(TimeOfDay::parse("23:59:59").unwrap(), tod(23, 59, 59));
    }

    #[test]
    fn should_fail_to_parse_unpadded_time() {
        let err = TimeOfDay::parse("9:5").unwrap_err();
        assert!(matches!(
            err,
            TickHubError::Unsupported(UnsupportedError::TimeFormat(ref s)) if s == "9:5"
        ));
    }

    #[test]
    fn should_fail_to_parse_out_of_range_time() {
        assert!(TimeOfDay::parse("24:00").is_err());
        assert!(TimeOfDay::parse("12:60").is_err());
    }

    #[test]
    fn should_reject_out_of_range_fields_as_usage_error() {
        let err = TimeOfDay::new(10, 75, 0).unwrap_err();
        assert!(matches!(
            err,
            TickHubError::Usage(UsageError::OutOfRange {
                field: "minute",
                value: 75,
                ..
            })
        ));
    }

    #[test]
    fn should_order_by_hour_then_minute_then_second() {
        assert!(tod(8, 59, 59) < tod(9, 0, 0));
        assert!(tod(9, 0, 1) > tod(9, 0, 0));
        assert!(tod(9, 1, 0) > tod(9, 0, 59));
    }

    #[test]
    fn should_test_membership_in_same_day_range() {
        let start = tod(8, 0, 0);
        let end = tod(22, 0, 0);
        assert!(tod(8, 0, 0).between(start, end));
        assert!(tod(12, 0, 0).between(start, end));
        assert!(!tod(22, 0, 0).between(start, end));
        assert!(!tod(7, 59, 59).between(start, end));
    }

    #[test]
    fn should_test_membership_in_overnight_range() {
        let start = tod(22, 0, 0);
        let end = tod(6, 0, 0);
        assert!(tod(23, 30, 0).between(start, end));
        assert!(tod(2, 0, 0).between(start, end));
        assert!(!tod(12, 0, 0).between(start, end));
    }

    #[test]
    fn should_wrap_past_midnight_when_adding_duration() {
        assert_eq!(tod(23, 30, 0) + TimeDelta::hours(1), tod(0, 30, 0));
        assert_eq!(tod(0, 10, 0) - TimeDelta::minutes(20), tod(23, 50, 0));
    }

    #[test]
    fn should_measure_forward_distance_between_times() {
        assert_eq!(tod(1, 0, 0) - tod(23, 0, 0), TimeDelta::hours(2));
        assert_eq!(tod(10, 0, 30) - tod(10, 0, 0), TimeDelta::seconds(30));
    }

    #[test]
    fn should_display_zero_padded() {
        assert_eq!(tod(7, 3, 9).to_string(), "07:03:09");
    }

    #[test]
    fn should_roundtrip_through_serde_json_as_string() {
        let time = tod(14, 30, 0);
        let json = serde_json::to_string(&time).unwrap();
        assert_eq!(json, "\"14:30:00\"");
        let parsed: TimeOfDay = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, time);
    }

    #[test]
    fn should_convert_to_naive_time() {
        let naive = tod(14, 30, 5).to_naive();
        assert_eq!(TimeOfDay::from(naive), tod(14, 30, 5));
    }
}
