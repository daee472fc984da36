//! Cron expression synthesis.
//!
//! Symbolic intervals (`hour`, `week`, `monday`, …) and fixed-unit durations
//! compile into a full six-field [`CronFieldMap`], rendered as
//! `second minute hour day-of-month month day-of-week`.
//!
//! Exactly one of day-of-month / day-of-week is `?` in every map produced
//! here.

use std::fmt;
use std::str::FromStr;

use chrono::{TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{TickHubError, UnsupportedError, UsageError};
use crate::time::{self, TimeOfDay, ZonedDateTime};

/// One of the six cron fields, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CronField {
    Second,
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
}

impl CronField {
    pub const ALL: [Self; 6] = [
        Self::Second,
        Self::Minute,
        Self::Hour,
        Self::DayOfMonth,
        Self::Month,
        Self::DayOfWeek,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// A complete cron field map. There is no way to build a partial one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CronFieldMap {
    fields: [String; 6],
}

impl CronFieldMap {
    fn from_table(fields: [&str; 6]) -> Self {
        Self {
            fields: fields.map(str::to_string),
        }
    }

    #[must_use]
    pub fn get(&self, field: CronField) -> &str {
        &self.fields[field.index()]
    }

    pub fn set(&mut self, field: CronField, value: impl Into<String>) {
        self.fields[field.index()] = value.into();
    }

    #[must_use]
    pub fn with(mut self, field: CronField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }
}

/// Fires every second.
impl Default for CronFieldMap {
    fn default() -> Self {
        Self::from_table(UNIT_PRESETS[CronUnit::Second as usize])
    }
}

impl fmt::Display for CronFieldMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.join(" "))
    }
}

/// Calendar granularity of a symbolic interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CronUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

// second, minute, hour, day-of-month, month, day-of-week
const UNIT_PRESETS: [[&str; 6]; 7] = [
    ["*", "*", "*", "?", "*", "*"],
    ["0", "*", "*", "?", "*", "*"],
    ["0", "0", "*", "?", "*", "*"],
    ["0", "0", "0", "?", "*", "*"],
    ["0", "0", "0", "?", "*", "MON"],
    ["0", "0", "0", "1", "*", "?"],
    ["0", "0", "0", "1", "1", "?"],
];

const WEEKDAY_ABBREVIATIONS: [(Weekday, &str); 7] = [
    (Weekday::Mon, "MON"),
    (Weekday::Tue, "TUE"),
    (Weekday::Wed, "WED"),
    (Weekday::Thu, "THU"),
    (Weekday::Fri, "FRI"),
    (Weekday::Sat, "SAT"),
    (Weekday::Sun, "SUN"),
];

const WEEKDAY_NAMES: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

const UNIT_NAMES: [(&str, CronUnit); 7] = [
    ("second", CronUnit::Second),
    ("minute", CronUnit::Minute),
    ("hour", CronUnit::Hour),
    ("day", CronUnit::Day),
    ("week", CronUnit::Week),
    ("month", CronUnit::Month),
    ("year", CronUnit::Year),
];

/// Cron abbreviation for a weekday (`MON`, `TUE`, …).
#[must_use]
pub fn weekday_abbreviation(day: Weekday) -> &'static str {
    WEEKDAY_ABBREVIATIONS
        .iter()
        .find_map(|(d, abbr)| (*d == day).then_some(*abbr))
        .unwrap_or("?")
}

/// Preset map for a symbolic unit.
#[must_use]
pub fn unit_preset(unit: CronUnit) -> CronFieldMap {
    CronFieldMap::from_table(UNIT_PRESETS[unit as usize])
}

/// Preset map for a weekday: the `day` preset restricted to that day.
#[must_use]
pub fn weekday_preset(day: Weekday) -> CronFieldMap {
    unit_preset(CronUnit::Day).with(CronField::DayOfWeek, weekday_abbreviation(day))
}

/// What `every` repeats on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Unit(CronUnit),
    Weekday(Weekday),
    Duration(TimeDelta),
}

impl FromStr for Interval {
    type Err = TickHubError;

    /// Accepts the unit and weekday names, or a `HH:MM[:SS]` duration.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = s.trim().to_ascii_lowercase();
        if let Some((_, unit)) = UNIT_NAMES.iter().find(|(name, _)| *name == symbol) {
            return Ok(Self::Unit(*unit));
        }
        if let Some((_, day)) = WEEKDAY_NAMES.iter().find(|(name, _)| *name == symbol) {
            return Ok(Self::Weekday(*day));
        }
        time::parse_duration(s.trim())
            .map(Self::Duration)
            .map_err(|_| UnsupportedError::Interval(s.to_string()).into())
    }
}

impl From<CronUnit> for Interval {
    fn from(value: CronUnit) -> Self {
        Self::Unit(value)
    }
}

impl From<Weekday> for Interval {
    fn from(value: Weekday) -> Self {
        Self::Weekday(value)
    }
}

impl From<TimeDelta> for Interval {
    fn from(value: TimeDelta) -> Self {
        Self::Duration(value)
    }
}

/// Time-of-day anchor for `every`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum At {
    Time(TimeOfDay),
    /// Parsed as a `HH:MM[:SS]` time of day.
    Text(String),
}

impl At {
    /// # Errors
    ///
    /// Returns [`UnsupportedError::TimeFormat`] when a text anchor does not parse.
    pub fn resolve(&self) -> Result<TimeOfDay, TickHubError> {
        match self {
            Self::Time(time) => Ok(*time),
            Self::Text(text) => TimeOfDay::parse(text),
        }
    }
}

impl From<TimeOfDay> for At {
    fn from(value: TimeOfDay) -> Self {
        Self::Time(value)
    }
}

impl From<&ZonedDateTime> for At {
    fn from(value: &ZonedDateTime) -> Self {
        Self::Time(value.to_time_of_day())
    }
}

impl From<&str> for At {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for At {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Compile `interval` (optionally anchored at `at`) into a field map.
///
/// `at` overwrites `hour`, `minute` and `second` of the preset, whatever the
/// preset held there (last write wins, no validation).
///
/// # Errors
///
/// - [`UsageError::AtWithDuration`] when `at` is combined with a duration
/// - [`UnsupportedError::Duration`] when the duration is not a pure
///   repetition of seconds, minutes or hours
/// - [`UnsupportedError::TimeFormat`] when a text `at` does not parse
pub fn every_map(interval: &Interval, at: Option<&At>) -> Result<CronFieldMap, TickHubError> {
    let map = match interval {
        Interval::Duration(duration) => {
            if at.is_some() {
                return Err(UsageError::AtWithDuration.into());
            }
            return duration_to_map(*duration);
        }
        Interval::Unit(unit) => unit_preset(*unit),
        Interval::Weekday(day) => weekday_preset(*day),
    };
    match at {
        Some(at) => Ok(at_condition(map, at.resolve()?)),
        None => Ok(map),
    }
}

/// Render `every(interval, at)` as a cron expression.
///
/// # Errors
///
/// See [`every_map`].
pub fn every(interval: &Interval, at: Option<&At>) -> Result<String, TickHubError> {
    every_map(interval, at).map(|map| map.to_string())
}

/// Overwrite the time fields of `map` with `time`.
#[must_use]
pub fn at_condition(map: CronFieldMap, time: TimeOfDay) -> CronFieldMap {
    map.with(CronField::Hour, time.hour().to_string())
        .with(CronField::Minute, time.minute().to_string())
        .with(CronField::Second, time.second().to_string())
}

/// Express a fixed-unit duration as a `*/N` repetition.
///
/// Only durations made purely of seconds, minutes or hours are accepted:
/// 90 seconds or 1h30m have no representation in this scheme, and neither
/// do zero, negative, sub-second or whole-day durations.
///
/// # Errors
///
/// Returns [`UnsupportedError::Duration`] naming the rejected duration.
pub fn duration_to_map(duration: TimeDelta) -> Result<CronFieldMap, TickHubError> {
    let unsupported = || UnsupportedError::Duration(duration.to_string());
    if duration <= TimeDelta::zero() || duration.subsec_nanos() != 0 {
        return Err(unsupported().into());
    }
    let total = duration.num_seconds();
    let components = [
        (CronUnit::Second, CronField::Second, total % 60, total),
        (CronUnit::Minute, CronField::Minute, total / 60 % 60, total / 60),
        (CronUnit::Hour, CronField::Hour, total / 3600 % 24, total / 3600),
    ];
    for (unit, field, count, whole) in components {
        if count == 0 {
            continue;
        }
        if count != whole {
            return Err(unsupported().into());
        }
        return Ok(unit_preset(unit).with(field, format!("*/{count}")));
    }
    Err(unsupported().into())
}

/// Validate a raw cron expression and normalize its whitespace.
///
/// Accepts six fields, or seven with a trailing year.
///
/// # Errors
///
/// Returns [`UnsupportedError::CronExpression`] for any other field count.
pub fn normalize_expression(expression: &str) -> Result<String, TickHubError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if !(6..=7).contains(&fields.len()) {
        return Err(UnsupportedError::CronExpression(expression.to_string()).into());
    }
    Ok(fields.join(" "))
}
