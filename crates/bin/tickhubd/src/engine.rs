//! In-memory hosting engine. Holds the sink rules register into and
//! routes raw state changes to fired triggers or delay gates.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

use tickhub_app::delay_gate::{DelayGate, GateSatisfied};
use tickhub_app::delay_table::DelayTable;
use tickhub_app::ports::{TimerFacility, TriggerSink};
use tickhub_app::services::trigger_service::TriggerService;
use tickhub_domain::entity::Target;
use tickhub_domain::error::TickHubError;
use tickhub_domain::event::StateChange;
use tickhub_domain::id::TriggerId;
use tickhub_domain::trigger::{GateState, TriggerDescriptor};

use crate::config::{ConfigError, Declaration, RuleConfig};

/// Sink keeping every registered descriptor in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    registered: Mutex<Vec<(TriggerId, TriggerDescriptor)>>,
}

impl MemorySink {
    /// Triggers whose descriptor matches `change`, in registration order.
    #[must_use]
    pub fn matching(&self, change: &StateChange) -> Vec<TriggerId> {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, descriptor)| descriptor.matches(change))
            .map(|(id, _)| *id)
            .collect()
    }

    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl TriggerSink for MemorySink {
    fn register(&self, descriptor: TriggerDescriptor) -> Result<TriggerId, TickHubError> {
        let id = TriggerId::new();
        match serde_json::to_string(&descriptor) {
            Ok(json) => tracing::debug!(trigger_id = %id, descriptor = %json, "descriptor stored"),
            Err(err) => tracing::warn!(trigger_id = %id, error = %err, "descriptor not serializable"),
        }
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, descriptor));
        Ok(id)
    }
}

/// Outcome of one matching trigger for a dispatched change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Undelayed trigger fired immediately.
    Fired(TriggerId),
    /// Delayed trigger; the gate moved to this state.
    Gated(TriggerId, GateState),
}

/// Wires the trigger service and the delay gate over one [`MemorySink`].
pub struct Engine<T> {
    sink: Arc<MemorySink>,
    service: TriggerService<Arc<MemorySink>>,
    gate: DelayGate<T>,
}

impl<T> Engine<T>
where
    T: TimerFacility + 'static,
{
    pub fn new(timers: Arc<T>, capacity: usize) -> Self {
        let sink = Arc::new(MemorySink::default());
        let delays = DelayTable::new();
        Self {
            service: TriggerService::new(Arc::clone(&sink), delays.clone()),
            gate: DelayGate::new(timers, delays, capacity),
            sink,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GateSatisfied> {
        self.gate.subscribe()
    }

    #[must_use]
    pub fn sink(&self) -> &MemorySink {
        &self.sink
    }

    /// Register the triggers a configured rule stands for.
    ///
    /// # Errors
    ///
    /// Returns whatever the trigger service rejects.
    pub fn declare(&self, declaration: &Declaration) -> Result<Vec<TriggerId>, TickHubError> {
        match declaration {
            Declaration::Every { interval, at } => {
                self.service.every(interval, at.as_ref()).map(|id| vec![id])
            }
            Declaration::Cron(expression) => self.service.cron(expression).map(|id| vec![id]),
            Declaration::Changed(request) => self.service.changed(request),
        }
    }

    /// Register every rule, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Rule`] naming the rule whose declaration the
    /// trigger service rejected, or the rule's validation error.
    pub fn declare_all(&self, rules: &[RuleConfig]) -> Result<usize, ConfigError> {
        let mut registered = 0;
        for rule in rules {
            let ids = self
                .declare(&rule.declaration()?)
                .map_err(|err| rule.rule_error(err))?;
            tracing::info!(rule = %rule.name, triggers = ids.len(), "rule declared");
            registered += ids.len();
        }
        Ok(registered)
    }

    /// Route one raw change to every trigger it matches.
    ///
    /// # Errors
    ///
    /// Returns an error if a delay record vanished between matching and
    /// processing.
    #[tracing::instrument(skip(self, change), fields(change = %change))]
    pub fn dispatch(&self, change: &StateChange) -> Result<Vec<Dispatch>, TickHubError> {
        let mut outcomes = Vec::new();
        for trigger_id in self.sink.matching(change) {
            if self.service.delays().contains(trigger_id) {
                let state = self
                    .gate
                    .process_change(trigger_id, &change.previous, &change.state)?;
                outcomes.push(Dispatch::Gated(trigger_id, state));
            } else {
                tracing::info!(%trigger_id, "trigger fired");
                outcomes.push(Dispatch::Fired(trigger_id));
            }
        }
        Ok(outcomes)
    }
}

/// Parse a `<target> <previous> <new>` input line.
///
/// Blank lines and lines starting with `#` yield `None`.
#[must_use]
pub fn parse_change(line: &str) -> Option<StateChange> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut parts = line.split_whitespace();
    let (target, previous, new) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some(StateChange::new(Target::parse(target), previous, new))
}
