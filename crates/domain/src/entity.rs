//! Watched entities: items, group members and things.
//!
//! The hosting engine owns the real registries; the trigger subsystem only
//! needs a name to key descriptors on and the state values it observes.

mod state;

pub use state::State;

use std::fmt;

use serde::{Deserialize, Serialize};

const GROUP_PREFIX: &str = "group:";
const THING_PREFIX: &str = "thing:";

/// An entity a change trigger can watch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum Target {
    /// A single item, by item name.
    Item(String),
    /// Every member of a group, keyed by the group's name.
    GroupMembers(String),
    /// A thing, by thing UID.
    Thing(String),
}

impl Target {
    #[must_use]
    pub fn item(name: impl Into<String>) -> Self {
        Self::Item(name.into())
    }

    #[must_use]
    pub fn group_members(group: impl Into<String>) -> Self {
        Self::GroupMembers(group.into())
    }

    #[must_use]
    pub fn thing(uid: impl Into<String>) -> Self {
        Self::Thing(uid.into())
    }

    /// Parse the short form used in configuration: `Name`, `group:Name`
    /// or `thing:binding:type:id`.
    #[must_use]
    pub fn parse(short: &str) -> Self {
        if let Some(group) = short.strip_prefix(GROUP_PREFIX) {
            Self::group_members(group)
        } else if let Some(uid) = short.strip_prefix(THING_PREFIX) {
            Self::thing(uid)
        } else {
            Self::item(short)
        }
    }

    /// Name the descriptor is keyed on (the group's name for group members).
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Item(name) | Self::GroupMembers(name) | Self::Thing(name) => name,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(name) => f.write_str(name),
            Self::GroupMembers(group) => write!(f, "{GROUP_PREFIX}{group}"),
            Self::Thing(uid) => write!(f, "{THING_PREFIX}{uid}"),
        }
    }
}
