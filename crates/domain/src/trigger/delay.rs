//! Delay gate for "changed … for <duration>" triggers.
//!
//! The gate is driven from outside: each raw change of the watched entity
//! calls [`TriggerDelay::on_change`], which says which timer to cancel and
//! whether to start a new one. When a started timer elapses the caller
//! reports it through [`TriggerDelay::on_elapsed`].

use chrono::TimeDelta;

use crate::entity::State;
use crate::id::TimerId;

/// Observable state of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No timer running.
    Idle,
    /// A timer is running for the tracked state.
    Waiting,
}

/// What the caller must do with the timer facility after a raw change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Precondition no longer holds: cancel `timer` (if any) and stay idle.
    Cancel { timer: Option<TimerId> },
    /// Cancel `cancel` (if any) and start a new timer for `duration`,
    /// then [`arm`](TriggerDelay::arm) the gate with it.
    Restart {
        cancel: Option<TimerId>,
        duration: TimeDelta,
    },
}

/// Debounce record attached to one registered change trigger.
///
/// `timer` is a handle into the timer facility; dropping this record
/// does not cancel the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDelay {
    to: Option<State>,
    from: Option<State>,
    duration: TimeDelta,
    timer: Option<TimerId>,
    tracking_to: Option<State>,
    last_observed: Option<State>,
}

impl TriggerDelay {
    #[must_use]
    pub fn new(to: Option<State>, from: Option<State>, duration: TimeDelta) -> Self {
        Self {
            to,
            from,
            duration,
            timer: None,
            tracking_to: None,
            last_observed: None,
        }
    }

    #[must_use]
    pub fn to(&self) -> Option<&State> {
        self.to.as_ref()
    }

    #[must_use]
    pub fn from(&self) -> Option<&State> {
        self.from.as_ref()
    }

    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.duration
    }

    #[must_use]
    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    #[must_use]
    pub fn tracking_to(&self) -> Option<&State> {
        self.tracking_to.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        if self.timer.is_some() {
            GateState::Waiting
        } else {
            GateState::Idle
        }
    }

    fn accepts(&self, previous: &State, new: &State) -> bool {
        self.to.as_ref().is_none_or(|to| to == new)
            && self.from.as_ref().is_none_or(|from| from == previous)
    }

    /// Feed a raw change into the gate.
    ///
    /// Any running timer is handed back for cancellation: either the
    /// transition no longer satisfies `to`/`from`, or it does and the wait
    /// starts over for the new state.
    pub fn on_change(&mut self, previous: &State, new: &State) -> GateDecision {
        self.last_observed = Some(new.clone());
        let running = self.timer.take();
        if !self.accepts(previous, new) {
            self.tracking_to = None;
            return GateDecision::Cancel { timer: running };
        }
        self.tracking_to = Some(new.clone());
        GateDecision::Restart {
            cancel: running,
            duration: self.duration,
        }
    }

    /// Record the timer started after [`GateDecision::Restart`].
    pub fn arm(&mut self, timer: TimerId) {
        self.timer = Some(timer);
    }

    /// Report that `timer` elapsed.
    ///
    /// Returns `true` when the gate is satisfied: `timer` is the one armed
    /// last and the tracked state is still the last one observed. Stale
    /// timers are ignored, so a gate is satisfied at most once per wait.
    pub fn on_elapsed(&mut self, timer: TimerId) -> bool {
        if self.timer != Some(timer) {
            return false;
        }
        self.timer = None;
        let tracked = self.tracking_to.take();
        tracked.is_some() && tracked == self.last_observed
    }

    /// Whether a timer is held and the facility reports it active.
    ///
    /// Pure query: never cancels or clears anything.
    pub fn timer_active(&self, is_active: impl FnOnce(TimerId) -> bool) -> bool {
        self.timer.is_some_and(is_active)
    }

    /// Hand back the running timer, leaving the gate idle.
    pub fn disarm(&mut self) -> Option<TimerId> {
        self.tracking_to = None;
        self.timer.take()
    }
}
