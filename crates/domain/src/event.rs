//! Event — a raw state change reported by the hosting engine.

use serde::{Deserialize, Serialize};

use crate::entity::{State, Target};

/// An immutable record of an entity moving from one state to another.
///
/// For group members, `entity` is the group (see [`Target::GroupMembers`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub entity: Target,
    pub previous: State,
    pub state: State,
}

impl StateChange {
    #[must_use]
    pub fn new(entity: Target, previous: impl Into<State>, state: impl Into<State>) -> Self {
        Self {
            entity,
            previous: previous.into(),
            state: state.into(),
        }
    }
}

impl std::fmt::Display for StateChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} -> {}", self.entity, self.previous, self.state)
    }
}
