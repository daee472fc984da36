//! Duration parsing and numeric conversion.

use chrono::TimeDelta;

use crate::error::{TickHubError, UnsupportedError};

/// Parse a `HH:MM[:SS]` string as a duration.
///
/// Hours are not limited to a single day; minutes and seconds must be below 60.
///
/// # Errors
///
/// Returns [`UnsupportedError::TimeFormat`] when the input does not match.
pub fn parse_duration(input: &str) -> Result<TimeDelta, TickHubError> {
    match super::split_clock(input) {
        Some((hours, minutes, seconds)) if minutes < 60 && seconds < 60 => Ok(TimeDelta::seconds(
            i64::from(hours) * 3600 + i64::from(minutes) * 60 + i64::from(seconds),
        )),
        _ => Err(UnsupportedError::TimeFormat(input.to_string()).into()),
    }
}

/// Interpret a number of seconds as a duration.
///
/// The fractional part becomes nanoseconds. Returns `None` for non-finite
/// or out-of-range values.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn from_seconds(seconds: f64) -> Option<TimeDelta> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    if nanos >= 1_000_000_000 {
        return TimeDelta::new(whole as i64 + 1, 0);
    }
    TimeDelta::new(whole as i64, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_minutes_and_seconds_as_duration() {
        assert_eq!(parse_duration("00:05:30").unwrap(), TimeDelta::seconds(330));
    }

    #[test]
    fn should_parse_hours_beyond_one_day() {
        assert_eq!(parse_duration("36:00").unwrap(), TimeDelta::hours(36));
    }

    #[test]
    fn should_reject_malformed_duration() {
        assert!(parse_duration("5m").is_err());
        assert!(parse_duration("00:61").is_err());
    }

    #[test]
    fn should_keep_fraction_as_nanoseconds() {
        let delta = from_seconds(1.5).unwrap();
        assert_eq!(delta.num_seconds(), 1);
        assert_eq!(delta.subsec_nanos(), 500_000_000);
    }

    #[test]
    fn should_convert_negative_seconds() {
        assert_eq!(from_seconds(-2.0).unwrap(), TimeDelta::seconds(-2));
        assert_eq!(from_seconds(-0.5).unwrap(), TimeDelta::milliseconds(-500));
    }

    #[test]
    fn should_reject_non_finite_seconds() {
        assert!(from_seconds(f64::NAN).is_none());
        assert!(from_seconds(f64::INFINITY).is_none());
    }
}
