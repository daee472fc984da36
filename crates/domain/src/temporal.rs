//! Coercion protocol shared by every temporal-like value.
//!
//! Binary comparisons and arithmetic between heterogeneous operands resolve
//! the right-hand operand against the left-hand one, in order:
//!
//! 1. same concrete type: compare directly (timestamps by instant);
//! 2. the right operand has a time-like view: project it to the left's type;
//! 3. the right operand is a date-only or time-only string: parse it and retry;
//! 4. the right operand offers [`Coerce`]: use the pair it returns;
//! 5. otherwise comparison is `None` and arithmetic is a [`TypeError`].
//!
//! Numeric seconds and durations coerce into each other through rule 4, and
//! third-party types plug in by implementing [`Coerce`].

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::sync::Arc;

use chrono::{FixedOffset, Offset, TimeDelta, Utc, Weekday};

use crate::error::{TickHubError, TypeError, UnsupportedError};
use crate::time::{self, TimeOfDay, ZonedDateTime};

/// Capability for values the core does not know to join the protocol.
pub trait Coerce: fmt::Debug + Send + Sync {
    /// Name reported in type errors.
    fn type_name(&self) -> &'static str;

    /// Return a same-typed pair `(left', self')`, or `None` when `self`
    /// has no representation compatible with `left`.
    fn coerce(&self, left: &Temporal) -> Option<(Temporal, Temporal)>;
}

/// A temporal-like operand.
#[derive(Debug, Clone)]
pub enum Temporal {
    TimeOfDay(TimeOfDay),
    Timestamp(ZonedDateTime),
    Duration(TimeDelta),
    /// A plain number interpreted as seconds.
    Seconds(f64),
    /// A time-only string, `HH:MM[:SS]`.
    TimeString(String),
    /// A date-only string, `YYYY-MM-DD`.
    DateString(String),
    Custom(Arc<dyn Coerce>),
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Sub,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
        }
    }
}

impl Temporal {
    /// Classify a string as a date-only or time-only operand.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.contains('-') {
            Self::DateString(value)
        } else {
            Self::TimeString(value)
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TimeOfDay(_) => "TimeOfDay",
            Self::Timestamp(_) => "ZonedDateTime",
            Self::Duration(_) => "Duration",
            Self::Seconds(_) => "Numeric",
            Self::TimeString(_) => "TimeString",
            Self::DateString(_) => "DateString",
            Self::Custom(custom) => custom.type_name(),
        }
    }

    /// Compare `self` with `other`, coercing `other` when the types differ.
    ///
    /// Returns `None` when the operands are incomparable.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        let (left, right) = self.coerce(other)?;
        direct(&left, &right)
    }

    /// Resolve `other` into a pair of operands of the same concrete type.
    #[must_use]
    pub fn coerce(&self, other: &Self) -> Option<(Self, Self)> {
        if same_kind(self, other) {
            return Some((self.clone(), other.clone()));
        }
        if let Some(view) = time_like_view(self, other) {
            return Some((self.clone(), view));
        }
        if let Some(parsed) = parse_text(self, other) {
            return self.coerce(&parsed);
        }
        coerce_with(self, other).filter(|(left, right)| same_kind(left, right))
    }

    /// Equality under coercion (`2024-03-01T10:00` equals `10:00:00` when
    /// compared as a time of day).
    #[must_use]
    pub fn coerced_eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Equality without coercion: same concrete type and equal values.
    #[must_use]
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => same_kind(self, other) && direct(self, other) == Some(Ordering::Equal),
        }
    }

    /// `self + other`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError`] when the operands have no common representation,
    /// or [`UnsupportedError`] when a string operand does not parse.
    pub fn checked_add(&self, other: &Self) -> Result<Self, TickHubError> {
        arithmetic(Op::Add, self, other)
    }

    /// `self - other`. Subtracting two timestamps yields a duration.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError`] when the operands have no common representation,
    /// or [`UnsupportedError`] when a string operand does not parse.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, TickHubError> {
        arithmetic(Op::Sub, self, other)
    }

    #[must_use]
    pub fn to_time_of_day(&self) -> Option<TimeOfDay> {
        match self {
            Self::TimeOfDay(t) => Some(*t),
            Self::Timestamp(ts) => Some(ts.to_time_of_day()),
            Self::TimeString(s) => TimeOfDay::parse(s).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_zoned(&self) -> Option<ZonedDateTime> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            Self::DateString(s) => ZonedDateTime::parse_date(s, utc()).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn hour(&self) -> Option<u32> {
        self.to_time_of_day().map(TimeOfDay::hour)
    }

    #[must_use]
    pub fn minute(&self) -> Option<u32> {
        self.to_time_of_day().map(TimeOfDay::minute)
    }

    #[must_use]
    pub fn second(&self) -> Option<u32> {
        self.to_time_of_day().map(TimeOfDay::second)
    }

    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.to_zoned().map(|ts| ts.year())
    }

    #[must_use]
    pub fn month(&self) -> Option<u32> {
        self.to_zoned().map(|ts| ts.month())
    }

    #[must_use]
    pub fn day(&self) -> Option<u32> {
        self.to_zoned().map(|ts| ts.day())
    }

    #[must_use]
    pub fn weekday(&self) -> Option<Weekday> {
        self.to_zoned().map(|ts| ts.weekday())
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

fn same_kind(left: &Temporal, right: &Temporal) -> bool {
    !matches!(left, Temporal::Custom(_)) && mem::discriminant(left) == mem::discriminant(right)
}

fn direct(left: &Temporal, right: &Temporal) -> Option<Ordering> {
    match (left, right) {
        (Temporal::TimeOfDay(a), Temporal::TimeOfDay(b)) => Some(a.cmp(b)),
        (Temporal::Timestamp(a), Temporal::Timestamp(b)) => Some(a.cmp(b)),
        (Temporal::Duration(a), Temporal::Duration(b)) => Some(a.cmp(b)),
        (Temporal::Seconds(a), Temporal::Seconds(b)) => a.partial_cmp(b),
        (Temporal::TimeString(a), Temporal::TimeString(b)) => {
            Some(TimeOfDay::parse(a).ok()?.cmp(&TimeOfDay::parse(b).ok()?))
        }
        (Temporal::DateString(a), Temporal::DateString(b)) => {
            let a = ZonedDateTime::parse_date(a, utc()).ok()?;
            let b = ZonedDateTime::parse_date(b, utc()).ok()?;
            Some(a.cmp(&b))
        }
        _ => None,
    }
}

/// Rule 2: project a time-like right operand onto the left's type.
fn time_like_view(left: &Temporal, right: &Temporal) -> Option<Temporal> {
    match (left, right) {
        (Temporal::TimeOfDay(_), Temporal::Timestamp(ts)) => {
            Some(Temporal::TimeOfDay(ts.to_time_of_day()))
        }
        (Temporal::Timestamp(ts), Temporal::TimeOfDay(t)) => Some(Temporal::Timestamp(ts.with_time(*t))),
        _ => None,
    }
}

/// Rule 3: parse a string right operand. Date strings are anchored to
/// midnight in the left operand's offset.
fn parse_text(left: &Temporal, right: &Temporal) -> Option<Temporal> {
    match right {
        Temporal::DateString(s) => {
            let offset = match left {
                Temporal::Timestamp(ts) => ts.offset(),
                _ => utc(),
            };
            ZonedDateTime::parse_date(s, offset)
                .ok()
                .map(Temporal::Timestamp)
        }
        Temporal::TimeString(s) => TimeOfDay::parse(s).ok().map(Temporal::TimeOfDay),
        _ => None,
    }
}

/// Rule 4: let the right operand produce a same-typed pair.
fn coerce_with(left: &Temporal, right: &Temporal) -> Option<(Temporal, Temporal)> {
    match (left, right) {
        (Temporal::Duration(d), Temporal::Seconds(n)) => Some((
            Temporal::Duration(*d),
            Temporal::Duration(time::from_seconds(*n)?),
        )),
        (Temporal::Seconds(n), Temporal::Duration(d)) => Some((
            Temporal::Duration(time::from_seconds(*n)?),
            Temporal::Duration(*d),
        )),
        (_, Temporal::Custom(custom)) => custom.coerce(left),
        _ => None,
    }
}

fn type_error(op: Op, left: &Temporal, right: &Temporal) -> TickHubError {
    TypeError {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    }
    .into()
}

fn seconds_to_delta(seconds: f64) -> Result<TimeDelta, TickHubError> {
    time::from_seconds(seconds)
        .ok_or_else(|| UnsupportedError::Duration(format!("{seconds} seconds")).into())
}

fn shift_delta(op: Op, a: TimeDelta, b: TimeDelta) -> Result<TimeDelta, TickHubError> {
    match op {
        Op::Add => a.checked_add(&b),
        Op::Sub => a.checked_sub(&b),
    }
    .ok_or_else(|| UnsupportedError::Duration(format!("{a} {} {b}", op.symbol())).into())
}

fn arithmetic(op: Op, left: &Temporal, right: &Temporal) -> Result<Temporal, TickHubError> {
    use Temporal as T;

    match (left, right) {
        (T::Timestamp(ts), T::Duration(d)) => match op {
            Op::Add => ts.checked_add(*d),
            Op::Sub => ts.checked_sub(*d),
        }
        .map(T::Timestamp)
        .ok_or_else(|| UnsupportedError::Duration(format!("{ts} {} {d}", op.symbol())).into()),
        (T::Timestamp(a), T::Timestamp(b)) => match op {
            Op::Sub => Ok(T::Duration(*a - *b)),
            Op::Add => Err(type_error(op, left, right)),
        },
        (T::Timestamp(ts), T::DateString(s)) => match op {
            Op::Sub => {
                let date = ZonedDateTime::parse_date(s, ts.offset())?;
                arithmetic(op, left, &T::Timestamp(date))
            }
            Op::Add => Err(type_error(op, left, right)),
        },
        (T::TimeOfDay(t), T::Duration(d)) => Ok(T::TimeOfDay(match op {
            Op::Add => *t + *d,
            Op::Sub => *t - *d,
        })),
        (T::TimeOfDay(a), T::TimeOfDay(b)) => match op {
            Op::Sub => Ok(T::Duration(*a - *b)),
            Op::Add => Err(type_error(op, left, right)),
        },
        (T::Duration(a), T::Duration(b)) => Ok(T::Duration(shift_delta(op, *a, *b)?)),
        (T::Seconds(a), T::Seconds(b)) => Ok(T::Seconds(match op {
            Op::Add => a + b,
            Op::Sub => a - b,
        })),
        (T::Seconds(n), T::Duration(d)) => {
            Ok(T::Duration(shift_delta(op, seconds_to_delta(*n)?, *d)?))
        }
        (T::Timestamp(_) | T::TimeOfDay(_) | T::Duration(_), T::Seconds(n)) => {
            arithmetic(op, left, &T::Duration(seconds_to_delta(*n)?))
        }
        (T::Timestamp(_) | T::TimeOfDay(_) | T::Duration(_), T::TimeString(s)) => {
            arithmetic(op, left, &T::Duration(time::parse_duration(s)?))
        }
        (_, T::Custom(custom)) => match custom.coerce(left) {
            Some((l, r)) if !matches!(r, T::Custom(_)) => arithmetic(op, &l, &r),
            _ => Err(type_error(op, left, right)),
        },
        _ => Err(type_error(op, left, right)),
    }
}

impl From<TimeOfDay> for Temporal {
    fn from(value: TimeOfDay) -> Self {
        Self::TimeOfDay(value)
    }
}

impl From<ZonedDateTime> for Temporal {
    fn from(value: ZonedDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl From<TimeDelta> for Temporal {
    fn from(value: TimeDelta) -> Self {
        Self::Duration(value)
    }
}

impl From<f64> for Temporal {
    fn from(value: f64) -> Self {
        Self::Seconds(value)
    }
}

impl From<i32> for Temporal {
    fn from(value: i32) -> Self {
        Self::Seconds(f64::from(value))
    }
}

impl From<&str> for Temporal {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TickHubError;

    fn ts(input: &str) -> Temporal {
        Temporal::Timestamp(ZonedDateTime::parse(input).unwrap())
    }

    fn tod(h: u32, m: u32, s: u32) -> Temporal {
        Temporal::TimeOfDay(TimeOfDay::new(h, m, s).unwrap())
    }

    /// Whole minutes, coercible into durations.
    #[derive(Debug)]
    struct Minutes(i64);

    impl Coerce for Minutes {
        fn type_name(&self) -> &'static str {
            "Minutes"
        }

        fn coerce(&self, left: &Temporal) -> Option<(Temporal, Temporal)> {
            match left {
                Temporal::Duration(_) | Temporal::Timestamp(_) | Temporal::TimeOfDay(_) => {
                    Some((left.clone(), Temporal::Duration(TimeDelta::minutes(self.0))))
                }
                _ => None,
            }
        }
    }

    #[test]
    fn should_compare_time_of_day_with_timestamp_ignoring_date() {
        let left = tod(14, 30, 0);
        assert_eq!(
            left.compare(&ts("1999-01-01T14:30:00+00:00")),
            Some(Ordering::Equal)
        );
        assert_eq!(
            left.compare(&ts("2030-06-15T09:00:00+00:00")),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn should_compare_timestamp_with_time_of_day_on_same_date() {
        let left = ts("2024-03-01T10:00:00+01:00");
        assert_eq!(left.compare(&tod(10, 0, 0)), Some(Ordering::Equal));
        assert_eq!(left.compare(&tod(11, 0, 0)), Some(Ordering::Less));
    }

    #[test]
    fn should_parse_time_string_as_time_of_day() {
        assert_eq!(tod(9, 5, 0).compare(&"09:05".into()), Some(Ordering::Equal));
        assert_eq!(
            ts("2024-03-01T08:00:00+00:00").compare(&"09:00".into()),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn should_anchor_date_string_in_left_offset() {
        let left = ts("2024-03-01T00:00:00+05:00");
        assert_eq!(left.compare(&"2024-03-01".into()), Some(Ordering::Equal));
        assert_eq!(left.compare(&"2024-03-02".into()), Some(Ordering::Less));
    }

    #[test]
    fn should_coerce_numeric_seconds_against_duration() {
        let left = Temporal::Duration(TimeDelta::seconds(90));
        assert_eq!(left.compare(&Temporal::Seconds(90.0)), Some(Ordering::Equal));
        assert_eq!(
            Temporal::Seconds(30.0).compare(&left),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn should_coerce_custom_type_through_capability() {
        let custom = Temporal::Custom(Arc::new(Minutes(2)));
        let left = Temporal::Duration(TimeDelta::seconds(120));
        assert_eq!(left.compare(&custom), Some(Ordering::Equal));
    }

    #[test]
    fn should_report_incomparable_instead_of_error() {
        let left = Temporal::Duration(TimeDelta::seconds(1));
        assert_eq!(left.compare(&tod(1, 0, 0)), None);
        assert_eq!(tod(1, 0, 0).compare(&"not a time".into()), None);
    }

    #[test]
    fn should_distinguish_strict_and_coerced_equality() {
        let time = tod(10, 0, 0);
        let stamp = ts("2024-03-01T10:00:00+00:00");
        assert!(time.coerced_eq(&stamp));
        assert!(!time.strict_eq(&stamp));
        assert!(time.strict_eq(&tod(10, 0, 0)));
    }

    #[test]
    fn should_yield_duration_when_subtracting_timestamps() {
        let a = ts("2024-03-01T10:00:00+00:00");
        let b = ts("2024-02-29T09:00:00+00:00");
        let diff = a.checked_sub(&b).unwrap();
        assert!(matches!(diff, Temporal::Duration(d) if d == TimeDelta::hours(25)));
        let back = a.checked_sub(&diff).unwrap();
        assert!(back.strict_eq(&b));
    }

    #[test]
    fn should_shift_timestamp_by_numeric_seconds_with_nanoseconds() {
        let a = ts("2024-03-01T10:00:00+02:00");
        let shifted = a.checked_add(&Temporal::Seconds(1.25)).unwrap();
        let Temporal::Timestamp(shifted) = shifted else {
            panic!("expected timestamp");
        };
        assert_eq!(shifted.second(), 1);
        assert_eq!(shifted.nanosecond(), 250_000_000);
        assert_eq!(shifted.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn should_report_unsupported_duration_when_shift_overflows() {
        let a = ts("2024-03-01T10:00:00+00:00");
        let err = a.checked_add(&Temporal::Seconds(1e13)).unwrap_err();
        assert!(matches!(err, TickHubError::Unsupported(UnsupportedError::Duration(_))));

        let err = a
            .checked_sub(&Temporal::Duration(TimeDelta::MAX))
            .unwrap_err();
        match err {
            TickHubError::Unsupported(UnsupportedError::Duration(text)) => {
                assert!(text.starts_with("2024-03-01T10:00:00+00:00 -"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn should_parse_time_string_as_duration_in_arithmetic() {
        let a = ts("2024-03-01T10:00:00+00:00");
        let shifted = a.checked_add(&"01:30".into()).unwrap();
        assert!(shifted.strict_eq(&ts("2024-03-01T11:30:00+00:00")));
    }

    #[test]
    fn should_add_custom_operand_via_coerce() {
        let a = ts("2024-03-01T10:00:00+00:00");
        let shifted = a
            .checked_add(&Temporal::Custom(Arc::new(Minutes(15))))
            .unwrap();
        assert!(shifted.strict_eq(&ts("2024-03-01T10:15:00+00:00")));
    }

    #[test]
    fn should_raise_type_error_naming_both_types() {
        let err = tod(1, 0, 0)
            .checked_add(&ts("2024-03-01T10:00:00+00:00"))
            .unwrap_err();
        match err {
            TickHubError::Type(e) => {
                assert_eq!(e.left, "TimeOfDay");
                assert_eq!(e.right, "ZonedDateTime");
                assert_eq!(e.op, "+");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn should_reject_adding_two_timestamps() {
        let a = ts("2024-03-01T10:00:00+00:00");
        assert!(matches!(a.checked_add(&a), Err(TickHubError::Type(_))));
    }

    #[test]
    fn should_expose_enumerated_accessors() {
        let a = ts("2024-03-01T10:20:30+00:00");
        assert_eq!(a.year(), Some(2024));
        assert_eq!(a.weekday(), Some(Weekday::Fri));
        assert_eq!(a.minute(), Some(20));
        assert_eq!(Temporal::Duration(TimeDelta::zero()).hour(), None);
    }
}
