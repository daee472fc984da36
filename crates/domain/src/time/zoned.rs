//! Absolute timestamp carrying a fixed UTC offset.

use std::fmt;
use std::ops::Sub;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    Timelike, Weekday,
};
use serde::{Deserialize, Serialize};

use super::TimeOfDay;
use crate::error::{TickHubError, UnsupportedError};

/// An absolute instant with the offset it was observed in.
///
/// Equality and ordering compare instants, so two values in different
/// offsets that denote the same moment are equal. The offset is opaque:
/// no timezone rules are applied beyond it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZonedDateTime(DateTime<FixedOffset>);

impl ZonedDateTime {
    #[must_use]
    pub fn new(inner: DateTime<FixedOffset>) -> Self {
        Self(inner)
    }

    /// Parse an RFC 3339 timestamp such as `2024-03-01T08:00:00+01:00`.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedError::TimeFormat`] when the input is not RFC 3339.
    pub fn parse(input: &str) -> Result<Self, TickHubError> {
        DateTime::parse_from_rfc3339(input)
            .map(Self)
            .map_err(|_| UnsupportedError::TimeFormat(input.to_string()).into())
    }

    /// Anchor a date-only `YYYY-MM-DD` string to midnight in `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedError::TimeFormat`] when the input is not a date.
    pub fn parse_date(input: &str, offset: FixedOffset) -> Result<Self, TickHubError> {
        if input.len() != 10 {
            return Err(UnsupportedError::TimeFormat(input.to_string()).into());
        }
        let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .map_err(|_| UnsupportedError::TimeFormat(input.to_string()))?;
        Ok(Self::anchor(date.and_time(NaiveTime::MIN), offset))
    }

    fn anchor(local: NaiveDateTime, offset: FixedOffset) -> Self {
        let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
        Self(DateTime::from_naive_utc_and_offset(utc, offset))
    }

    #[must_use]
    pub fn inner(&self) -> DateTime<FixedOffset> {
        self.0
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        *self.0.offset()
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    #[must_use]
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    #[must_use]
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    #[must_use]
    pub fn second(&self) -> u32 {
        self.0.second()
    }

    #[must_use]
    pub fn nanosecond(&self) -> u32 {
        self.0.nanosecond()
    }

    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Seconds since the Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }

    #[must_use]
    pub fn to_time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_zoned(self)
    }

    pub(crate) fn naive_time(&self) -> NaiveTime {
        self.0.time()
    }

    /// Start of the same local day, in the same offset.
    #[must_use]
    pub fn midnight(&self) -> Self {
        self.with_time(TimeOfDay::midnight())
    }

    /// The same local date at `time`, in the same offset.
    #[must_use]
    pub fn with_time(&self, time: TimeOfDay) -> Self {
        Self::anchor(self.0.date_naive().and_time(time.to_naive()), self.offset())
    }

    /// Shift forward by `delta`, keeping the offset.
    ///
    /// Returns `None` when the result leaves the representable range.
    #[must_use]
    pub fn checked_add(&self, delta: TimeDelta) -> Option<Self> {
        self.0.checked_add_signed(delta).map(Self)
    }

    /// Shift backward by `delta`, keeping the offset.
    ///
    /// Returns `None` when the result leaves the representable range.
    #[must_use]
    pub fn checked_sub(&self, delta: TimeDelta) -> Option<Self> {
        self.0.checked_sub_signed(delta).map(Self)
    }
}

impl From<DateTime<FixedOffset>> for ZonedDateTime {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self(value)
    }
}

/// Subtracting two timestamps yields the distance between their instants.
impl Sub for ZonedDateTime {
    type Output = TimeDelta;

    fn sub(self, rhs: Self) -> TimeDelta {
        self.0.signed_duration_since(rhs.0)
    }
}

impl fmt::Display for ZonedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(input: &str) -> ZonedDateTime {
        ZonedDateTime::parse(input).unwrap()
    }

    #[test]
    fn should_yield_duration_when_subtracting_timestamps() {
        let a = ts("2024-03-01T10:00:00+01:00");
        let b = ts("2024-03-01T08:30:00+01:00");
        assert_eq!(a - b, TimeDelta::minutes(90));
    }

    #[test]
    fn should_roundtrip_when_subtracting_the_difference() {
        let a = ts("2024-03-01T10:00:00+01:00");
        let b = ts("2023-12-24T18:45:12-05:00");
        let diff: TimeDelta = a - b;
        assert_eq!(a.checked_sub(diff), Some(b));
    }

    #[test]
    fn should_return_none_when_shift_leaves_range() {
        let a = ts("2024-03-01T10:00:00+00:00");
        assert!(a.checked_add(TimeDelta::MAX).is_none());
        assert!(a.checked_sub(TimeDelta::MAX).is_none());
    }

    #[test]
    fn should_preserve_offset_when_adding_duration() {
        let a = ts("2024-03-01T23:30:00+02:00");
        let shifted = a.checked_add(TimeDelta::hours(1)).unwrap();
        assert_eq!(shifted.offset(), a.offset());
        assert_eq!(shifted.day(), 2);
        assert_eq!(shifted.hour(), 0);
    }

    #[test]
    fn should_compare_instants_across_offsets() {
        assert_eq!(
            ts("2024-03-01T10:00:00+01:00"),
            ts("2024-03-01T09:00:00+00:00")
        );
    }

    #[test]
    fn should_anchor_date_string_to_midnight_in_offset() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let date = ZonedDateTime::parse_date("2024-03-01", offset).unwrap();
        assert_eq!(date, ts("2024-03-01T00:00:00+01:00"));
        assert_eq!(date.offset(), offset);
    }

    #[test]
    fn should_reject_malformed_date_string() {
        let offset = FixedOffset::east_opt(0).unwrap();
        assert!(ZonedDateTime::parse_date("2024-3-1", offset).is_err());
        assert!(ZonedDateTime::parse_date("yesterday", offset).is_err());
    }

    #[test]
    fn should_project_time_of_day_in_own_offset() {
        let a = ts("2024-03-01T14:30:05+05:00");
        assert_eq!(a.to_time_of_day(), TimeOfDay::new(14, 30, 5).unwrap());
    }

    #[test]
    fn should_replace_time_keeping_date() {
        let a = ts("2024-03-01T14:30:05+05:00");
        assert_eq!(a.midnight(), ts("2024-03-01T00:00:00+05:00"));
        assert_eq!(
            a.with_time(TimeOfDay::noon()),
            ts("2024-03-01T12:00:00+05:00")
        );
    }

    #[test]
    fn should_expose_calendar_accessors() {
        let a = ts("2024-03-01T14:30:05+05:00");
        assert_eq!(a.year(), 2024);
        assert_eq!(a.month(), 3);
        assert_eq!(a.weekday(), Weekday::Fri);
        assert_eq!(a.minute(), 30);
        assert_eq!(a.second(), 5);
    }
}
