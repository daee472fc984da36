//! Common error types used across the workspace.
//!
//! Each failure class has its own typed error and converts into
//! [`TickHubError`] via `#[from]`. Comparisons never error: incomparable
//! operands yield `None` instead.

/// Top-level error for every fallible tickhub operation.
#[derive(Debug, thiserror::Error)]
pub enum TickHubError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}

/// The caller supplied an invalid combination of arguments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("`at` cannot be combined with a duration interval")]
    AtWithDuration,

    #[error("a delayed trigger accepts at most one `{side}` value, got {count}")]
    MultipleValuesWithDelay { side: &'static str, count: usize },

    #[error("{field} {value} is out of range 0..={max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },
}

/// A value that cannot be expressed by the subsystem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedError {
    #[error("duration {0} cannot be expressed as a fixed-unit cron repetition")]
    Duration(String),

    #[error("`{0}` is not a recognized time format")]
    TimeFormat(String),

    #[error("`{0}` is not a recognized interval")]
    Interval(String),

    #[error("`{0}` is not a valid cron expression")]
    CronExpression(String),
}

/// Arithmetic between two temporal operands that have no common representation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply `{op}` to {left} and {right}")]
pub struct TypeError {
    pub op: &'static str,
    pub left: &'static str,
    pub right: &'static str,
}

/// A record looked up by identifier does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
