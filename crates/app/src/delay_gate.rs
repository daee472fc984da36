//! Delay gate — drives [`TriggerDelay`] records from raw change events.
//!
//! The hosting engine reports every raw firing of a delayed trigger through
//! [`DelayGate::process_change`]. The gate cancels or restarts the record's
//! timer, and when a timer elapses with the tracked state unchanged it
//! publishes a [`GateSatisfied`] notification to subscribers.

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::broadcast;

use tickhub_domain::entity::State;
use tickhub_domain::error::{NotFoundError, TickHubError};
use tickhub_domain::id::TriggerId;
use tickhub_domain::trigger::{GateDecision, GateState, TriggerDelay};

use crate::delay_table::{DelayRecord, DelayTable, lock};
use crate::ports::{ElapsedCallback, TimerFacility};

/// A delayed trigger whose state held for the whole delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSatisfied {
    pub trigger_id: TriggerId,
    pub state: State,
}

/// Drives delay records against a timer facility.
pub struct DelayGate<T> {
    timers: Arc<T>,
    delays: DelayTable,
    satisfied: broadcast::Sender<GateSatisfied>,
}

impl<T> DelayGate<T>
where
    T: TimerFacility + 'static,
{
    /// Create a gate over `delays`, buffering up to `capacity`
    /// notifications per slow subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(timers: Arc<T>, delays: DelayTable, capacity: usize) -> Self {
        let (satisfied, _) = broadcast::channel(capacity);
        Self {
            timers,
            delays,
            satisfied,
        }
    }

    /// Subscribe to satisfied notifications published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GateSatisfied> {
        self.satisfied.subscribe()
    }

    /// Process one raw change of the entity watched by `trigger_id`.
    ///
    /// Runs to completion under the record's lock: the previous timer is
    /// cancelled, and when the change satisfies `to`/`from` a new timer is
    /// started and armed before the lock is released.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no delay record exists for `trigger_id`.
    #[tracing::instrument(skip(self))]
    pub fn process_change(
        &self,
        trigger_id: TriggerId,
        previous: &State,
        new: &State,
    ) -> Result<GateState, TickHubError> {
        let record = self.record(trigger_id)?;
        let mut delay = lock(&record);
        match delay.on_change(previous, new) {
            GateDecision::Cancel { timer } => {
                if let Some(timer) = timer {
                    self.timers.cancel(timer);
                    tracing::debug!(%timer, "pending wait abandoned");
                }
            }
            GateDecision::Restart { cancel, duration } => {
                if let Some(timer) = cancel {
                    self.timers.cancel(timer);
                }
                let callback = self.elapsed_callback(trigger_id, Arc::downgrade(&record));
                let timer = self.timers.start(duration, callback);
                delay.arm(timer);
                tracing::debug!(%timer, %duration, "waiting for state to hold");
            }
        }
        Ok(delay.state())
    }

    /// Whether the record holds a timer the facility reports active.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no delay record exists for `trigger_id`.
    pub fn timer_active(&self, trigger_id: TriggerId) -> Result<bool, TickHubError> {
        let record = self.record(trigger_id)?;
        let delay = lock(&record);
        Ok(delay.timer_active(|timer| self.timers.is_active(timer)))
    }

    /// Current state of the record.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no delay record exists for `trigger_id`.
    pub fn state(&self, trigger_id: TriggerId) -> Result<GateState, TickHubError> {
        let record = self.record(trigger_id)?;
        let state = lock(&record).state();
        Ok(state)
    }

    /// Remove the record and cancel its running timer, if any.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no delay record exists for `trigger_id`.
    #[tracing::instrument(skip(self))]
    pub fn teardown(&self, trigger_id: TriggerId) -> Result<(), TickHubError> {
        let record = self
            .delays
            .remove(trigger_id)
            .ok_or_else(|| not_found(trigger_id))?;
        if let Some(timer) = lock(&record).disarm() {
            self.timers.cancel(timer);
        }
        Ok(())
    }

    fn record(&self, trigger_id: TriggerId) -> Result<DelayRecord, TickHubError> {
        self.delays
            .get(trigger_id)
            .ok_or_else(|| not_found(trigger_id).into())
    }

    fn elapsed_callback(
        &self,
        trigger_id: TriggerId,
        record: Weak<Mutex<TriggerDelay>>,
    ) -> ElapsedCallback {
        let satisfied = self.satisfied.clone();
        Box::new(move |timer| {
            let Some(record) = record.upgrade() else {
                tracing::trace!(%trigger_id, %timer, "delay record gone, ignoring timer");
                return;
            };
            let mut delay = lock(&record);
            let tracked = delay.tracking_to().cloned();
            match tracked {
                Some(state) if delay.on_elapsed(timer) => {
                    tracing::info!(%trigger_id, %state, "delayed trigger satisfied");
                    // No subscribers is fine; the notification is dropped.
                    let _ = satisfied.send(GateSatisfied { trigger_id, state });
                }
                _ => tracing::trace!(%trigger_id, %timer, "stale timer ignored"),
            }
        })
    }
}

fn not_found(trigger_id: TriggerId) -> NotFoundError {
    NotFoundError {
        entity: "TriggerDelay",
        id: trigger_id.to_string(),
    }
}
