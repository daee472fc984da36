//! Trigger service — use-cases for declaring triggers.

use chrono::TimeDelta;
use tickhub_domain::cron::{At, Interval};
use tickhub_domain::entity::{State, Target};
use tickhub_domain::error::{TickHubError, UsageError};
use tickhub_domain::id::TriggerId;
use tickhub_domain::trigger::{self, TriggerDelay, TriggerDescriptor};

use crate::delay_table::DelayTable;
use crate::ports::TriggerSink;

/// Arguments of a `changed` declaration.
#[derive(Debug, Clone, Default)]
pub struct ChangedRequest {
    targets: Vec<Target>,
    to: Vec<State>,
    from: Vec<State>,
    delay: Option<TimeDelta>,
}

impl ChangedRequest {
    #[must_use]
    pub fn new(targets: impl IntoIterator<Item = Target>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Match any of these new states.
    #[must_use]
    pub fn to(mut self, states: impl IntoIterator<Item = State>) -> Self {
        self.to.extend(states);
        self
    }

    /// Match any of these previous states.
    #[must_use]
    pub fn from(mut self, states: impl IntoIterator<Item = State>) -> Self {
        self.from.extend(states);
        self
    }

    /// Only fire once the new state has held for `duration`.
    #[must_use]
    pub fn for_duration(mut self, duration: TimeDelta) -> Self {
        self.delay = Some(duration);
        self
    }

    fn single(side: &'static str, values: &[State]) -> Result<Option<State>, UsageError> {
        match values {
            [] => Ok(None),
            [value] => Ok(Some(value.clone())),
            _ => Err(UsageError::MultipleValuesWithDelay {
                side,
                count: values.len(),
            }),
        }
    }
}

/// Application service that turns trigger declarations into descriptors.
pub struct TriggerService<S> {
    sink: S,
    delays: DelayTable,
}

impl<S: TriggerSink> TriggerService<S> {
    /// Create a new service registering into `sink` and recording delays
    /// into `delays`.
    pub fn new(sink: S, delays: DelayTable) -> Self {
        Self { sink, delays }
    }

    #[must_use]
    pub fn delays(&self) -> &DelayTable {
        &self.delays
    }

    /// Register a cron trigger compiled from a symbolic interval.
    ///
    /// # Errors
    ///
    /// Returns a usage error for `at` combined with a duration, or an
    /// unsupported-value error for a duration or `at` that cannot be expressed.
    #[tracing::instrument(skip(self))]
    pub fn every(&self, interval: &Interval, at: Option<&At>) -> Result<TriggerId, TickHubError> {
        let descriptor = TriggerDescriptor::every(interval, at)?;
        self.register(descriptor)
    }

    /// Register a cron trigger from a raw expression.
    ///
    /// # Errors
    ///
    /// Returns an unsupported-value error for a malformed expression, or
    /// whatever the sink reports.
    #[tracing::instrument(skip(self))]
    pub fn cron(&self, expression: &str) -> Result<TriggerId, TickHubError> {
        let descriptor = TriggerDescriptor::cron(expression)?;
        self.register(descriptor)
    }

    /// Register change triggers.
    ///
    /// Without a delay, one descriptor per target per `(to, from)` pair.
    /// With a delay, one unconditional descriptor per target plus a
    /// [`TriggerDelay`] keyed by its identity; `to`/`from` must then hold at
    /// most one value each.
    ///
    /// Registration is not atomic: when the sink fails partway, descriptors
    /// it already accepted stay registered (the sink has no withdrawal), but
    /// delay records added by this call are removed again.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::MultipleValuesWithDelay`] before registering
    /// anything, or whatever the sink reports.
    #[tracing::instrument(skip(self, request), fields(targets = request.targets.len()))]
    pub fn changed(&self, request: &ChangedRequest) -> Result<Vec<TriggerId>, TickHubError> {
        let Some(duration) = request.delay else {
            let descriptors =
                trigger::changed_descriptors(&request.targets, &request.to, &request.from);
            let mut ids = Vec::with_capacity(descriptors.len());
            for descriptor in descriptors {
                match self.register(descriptor) {
                    Ok(id) => ids.push(id),
                    Err(err) => {
                        warn_partial(&ids, &err);
                        return Err(err);
                    }
                }
            }
            return Ok(ids);
        };

        let to = ChangedRequest::single("to", &request.to)?;
        let from = ChangedRequest::single("from", &request.from)?;
        let mut ids = Vec::with_capacity(request.targets.len());
        for target in &request.targets {
            let id = match self.register(TriggerDescriptor::changed(target, None, None)) {
                Ok(id) => id,
                Err(err) => {
                    for id in &ids {
                        self.delays.remove(*id);
                    }
                    warn_partial(&ids, &err);
                    return Err(err);
                }
            };
            self.delays
                .insert(id, TriggerDelay::new(to.clone(), from.clone(), duration));
            tracing::debug!(trigger_id = %id, %duration, "delay gate recorded");
            ids.push(id);
        }
        Ok(ids)
    }

    /// Forget the delay record of an undeployed trigger.
    ///
    /// A running timer is not cancelled here; see
    /// [`DelayGate::teardown`](crate::delay_gate::DelayGate::teardown).
    pub fn undeploy(&self, trigger_id: TriggerId) -> bool {
        self.delays.remove(trigger_id).is_some()
    }

    fn register(&self, descriptor: TriggerDescriptor) -> Result<TriggerId, TickHubError> {
        let kind = descriptor.kind();
        let id = self.sink.register(descriptor)?;
        tracing::info!(trigger_id = %id, %kind, "trigger registered");
        Ok(id)
    }
}

fn warn_partial(registered: &[TriggerId], err: &TickHubError) {
    if !registered.is_empty() {
        tracing::warn!(
            registered = registered.len(),
            error = %err,
            "sink failed partway, earlier descriptors stay registered"
        );
    }
}
