//! Trigger — canonical descriptors handed to the registration sink.

mod delay;

pub use delay::{GateDecision, GateState, TriggerDelay};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cron::{self, At, Interval};
use crate::entity::{State, Target};
use crate::error::TickHubError;
use crate::event::StateChange;

/// Kind of a registered trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerKind {
    Cron,
    ItemStateChange,
    GroupStateChange,
    ThingChange,
}

/// Config keys of a change trigger: entity name, previous value, new value.
struct ChangeKeys {
    name: &'static str,
    previous: &'static str,
    state: &'static str,
}

impl TriggerKind {
    /// Module type identifier understood by the hosting engine.
    #[must_use]
    pub fn type_uid(self) -> &'static str {
        match self {
            Self::Cron => "timer.GenericCronTrigger",
            Self::ItemStateChange => "core.ItemStateChangeTrigger",
            Self::GroupStateChange => "core.GroupStateChangeTrigger",
            Self::ThingChange => "core.ThingStatusChangeTrigger",
        }
    }

    fn for_target(target: &Target) -> Self {
        match target {
            Target::Item(_) => Self::ItemStateChange,
            Target::GroupMembers(_) => Self::GroupStateChange,
            Target::Thing(_) => Self::ThingChange,
        }
    }

    fn change_keys(self) -> Option<ChangeKeys> {
        let (name, previous, state) = match self {
            Self::Cron => return None,
            Self::ItemStateChange => ("itemName", "previousState", "state"),
            Self::GroupStateChange => ("groupName", "previousState", "state"),
            Self::ThingChange => ("thingUID", "previousStatus", "status"),
        };
        Some(ChangeKeys {
            name,
            previous,
            state,
        })
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_uid())
    }
}

/// An immutable `(kind, config)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    kind: TriggerKind,
    config: BTreeMap<String, String>,
}

impl TriggerDescriptor {
    /// Cron trigger from a raw expression.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::UnsupportedError::CronExpression`] when the
    /// expression does not have six or seven fields.
    pub fn cron(expression: &str) -> Result<Self, TickHubError> {
        let expression = cron::normalize_expression(expression)?;
        Ok(Self {
            kind: TriggerKind::Cron,
            config: BTreeMap::from([("cronExpression".to_string(), expression)]),
        })
    }

    /// Cron trigger synthesized from a symbolic interval.
    ///
    /// # Errors
    ///
    /// See [`cron::every_map`].
    pub fn every(interval: &Interval, at: Option<&At>) -> Result<Self, TickHubError> {
        let expression = cron::every(interval, at)?;
        Self::cron(&expression)
    }

    /// Change trigger on `target`, constrained only on the sides given.
    #[must_use]
    pub fn changed(target: &Target, to: Option<&State>, from: Option<&State>) -> Self {
        let kind = TriggerKind::for_target(target);
        let mut config = BTreeMap::new();
        if let Some(keys) = kind.change_keys() {
            config.insert(keys.name.to_string(), target.name().to_string());
            if let Some(from) = from {
                config.insert(keys.previous.to_string(), from.to_string());
            }
            if let Some(to) = to {
                config.insert(keys.state.to_string(), to.to_string());
            }
        }
        Self { kind, config }
    }

    #[must_use]
    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    #[must_use]
    pub fn config(&self) -> &BTreeMap<String, String> {
        &self.config
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// Whether a raw change satisfies this descriptor's constraints.
    ///
    /// Cron descriptors never match state changes.
    #[must_use]
    pub fn matches(&self, change: &StateChange) -> bool {
        let Some(keys) = self.kind.change_keys() else {
            return false;
        };
        if TriggerKind::for_target(&change.entity) != self.kind
            || self.get(keys.name) != Some(change.entity.name())
        {
            return false;
        }
        let side_matches = |key: &str, actual: &State| {
            self.get(key)
                .is_none_or(|expected| expected == actual.as_str())
        };
        side_matches(keys.previous, &change.previous) && side_matches(keys.state, &change.state)
    }
}

impl std::fmt::Display for TriggerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, (key, value)) in self.config.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str(")")
    }
}

/// One descriptor per target per `(to, from)` combination.
///
/// An empty `to` or `from` slice means "any value" on that side. Two
/// non-empty slices expand to their Cartesian product, not a zip.
#[must_use]
pub fn changed_descriptors(targets: &[Target], to: &[State], from: &[State]) -> Vec<TriggerDescriptor> {
    let to_values: Vec<Option<&State>> = any_or_each(to);
    let from_values: Vec<Option<&State>> = any_or_each(from);
    let mut descriptors = Vec::with_capacity(targets.len() * to_values.len() * from_values.len());
    for target in targets {
        for to in &to_values {
            for from in &from_values {
                descriptors.push(TriggerDescriptor::changed(target, *to, *from));
            }
        }
    }
    descriptors
}

fn any_or_each(values: &[State]) -> Vec<Option<&State>> {
    if values.is_empty() {
        vec![None]
    } else {
        values.iter().map(Some).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cron::CronUnit;

    #[test]
    fn should_build_item_descriptor_with_both_constraints() {
        let d = TriggerDescriptor::changed(
            &Target::item("Door"),
            Some(&State::Open),
            Some(&State::Closed),
        );
        assert_eq!(d.kind(), TriggerKind::ItemStateChange);
        assert_eq!(d.get("itemName"), Some("Door"));
        assert_eq!(d.get("state"), Some("OPEN"));
        assert_eq!(d.get("previousState"), Some("CLOSED"));
    }

    #[test]
    fn should_omit_unconstrained_sides() {
        let d = TriggerDescriptor::changed(&Target::item("Door"), None, None);
        assert_eq!(d.config().len(), 1);
        assert!(d.get("state").is_none());
        assert!(d.get("previousState").is_none());
    }

    #[test]
    fn should_key_group_members_on_group_name() {
        let d = TriggerDescriptor::changed(&Target::group_members("Doors"), Some(&State::Open), None);
        assert_eq!(d.kind(), TriggerKind::GroupStateChange);
        assert_eq!(d.get("groupName"), Some("Doors"));
        assert!(d.get("itemName").is_none());
    }

    #[test]
    fn should_use_status_keys_for_things() {
        let online = State::from("ONLINE");
        let d = TriggerDescriptor::changed(&Target::thing("mqtt:broker:home"), Some(&online), None);
        assert_eq!(d.kind(), TriggerKind::ThingChange);
        assert_eq!(d.get("thingUID"), Some("mqtt:broker:home"));
        assert_eq!(d.get("status"), Some("ONLINE"));
    }

    #[test]
    fn should_expand_cartesian_product_of_to_and_from() {
        let descriptors = changed_descriptors(
            &[Target::item("Lamp")],
            &[State::from("A"), State::from("B")],
            &[State::from("C"), State::from("D")],
        );
        assert_eq!(descriptors.len(), 4);
        let pairs: Vec<_> = descriptors
            .iter()
            .map(|d| (d.get("previousState").unwrap(), d.get("state").unwrap()))
            .collect();
        assert!(pairs.contains(&("C", "A")));
        assert!(pairs.contains(&("D", "A")));
        assert!(pairs.contains(&("C", "B")));
        assert!(pairs.contains(&("D", "B")));
    }

    #[test]
    fn should_emit_one_descriptor_per_target_when_unconstrained() {
        let descriptors =
            changed_descriptors(&[Target::item("A"), Target::thing("b:c:d")], &[], &[]);
        assert_eq!(descriptors.len(), 2);
    }

    #[test]
    fn should_build_cron_descriptor_from_interval() {
        let d = TriggerDescriptor::every(&Interval::Unit(CronUnit::Minute), None).unwrap();
        assert_eq!(d.kind(), TriggerKind::Cron);
        assert_eq!(d.get("cronExpression"), Some("0 * * ? * *"));
    }

    #[test]
    fn should_reject_malformed_cron_expression() {
        assert!(TriggerDescriptor::cron("every day").is_err());
    }

    #[test]
    fn should_match_change_satisfying_constraints() {
        let d = TriggerDescriptor::changed(&Target::item("Door"), Some(&State::Open), None);
        assert!(d.matches(&StateChange::new(Target::item("Door"), "CLOSED", "OPEN")));
        assert!(!d.matches(&StateChange::new(Target::item("Door"), "OPEN", "CLOSED")));
        assert!(!d.matches(&StateChange::new(Target::item("Window"), "CLOSED", "OPEN")));
    }

    #[test]
    fn should_not_match_item_change_against_group_descriptor() {
        let d = TriggerDescriptor::changed(&Target::group_members("Door"), None, None);
        assert!(!d.matches(&StateChange::new(Target::item("Door"), "CLOSED", "OPEN")));
        assert!(d.matches(&StateChange::new(Target::group_members("Door"), "CLOSED", "OPEN")));
    }

    #[test]
    fn should_never_match_cron_descriptor() {
        let d = TriggerDescriptor::cron("0 0 * ? * *").unwrap();
        assert!(!d.matches(&StateChange::new(Target::item("Door"), "CLOSED", "OPEN")));
    }

    #[test]
    fn should_display_kind_and_config() {
        let d = TriggerDescriptor::changed(&Target::item("Door"), Some(&State::Open), None);
        assert_eq!(
            d.to_string(),
            "core.ItemStateChangeTrigger(itemName=Door, state=OPEN)"
        );
    }

    #[test]
    fn should_roundtrip_descriptor_through_serde_json() {
        let d = TriggerDescriptor::changed(&Target::item("Door"), Some(&State::Open), None);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "ITEM_STATE_CHANGE");
        let parsed: TriggerDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, d);
    }
}
