//! Entity state — the value an item or thing reports.

use serde::{Deserialize, Serialize};

/// Observed state of an entity.
///
/// `PartialEq` is strict: `On` and `Other("on")` differ. Use
/// [`State::loosely_eq`] for the textual, case-insensitive comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum State {
    On,
    Off,
    Open,
    Closed,
    #[default]
    Null,
    Undef,
    /// Any other value (numbers, strings, thing statuses, …).
    Other(String),
}

impl State {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Null => "NULL",
            Self::Undef => "UNDEF",
            Self::Other(value) => value,
        }
    }

    /// Whether the entity holds an actual value (not `NULL`/`UNDEF`).
    #[must_use]
    pub fn is_defined(&self) -> bool {
        !matches!(self, Self::Null | Self::Undef)
    }

    /// Equality under coercion: compares the textual form, ignoring case.
    #[must_use]
    pub fn loosely_eq(&self, other: &Self) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }
}

impl From<&str> for State {
    fn from(value: &str) -> Self {
        match value {
            "ON" => Self::On,
            "OFF" => Self::Off,
            "OPEN" => Self::Open,
            "CLOSED" => Self::Closed,
            "NULL" => Self::Null,
            "UNDEF" => Self::Undef,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for State {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<State> for String {
    fn from(value: State) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
