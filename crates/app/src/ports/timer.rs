//! Timer port — the scheduling facility owned by the engine.

use std::sync::Arc;

use chrono::TimeDelta;
use tickhub_domain::id::TimerId;

/// Invoked once with the timer's own id when it elapses.
pub type ElapsedCallback = Box<dyn FnOnce(TimerId) + Send + 'static>;

/// Starts, cancels and queries timers. All calls are fire-and-forget.
///
/// Implementations must not invoke `on_elapsed` from inside [`start`](Self::start):
/// callers hold the delay record's lock while starting a timer.
pub trait TimerFacility: Send + Sync {
    /// Schedule `on_elapsed` after `duration` and return a handle to it.
    fn start(&self, duration: TimeDelta, on_elapsed: ElapsedCallback) -> TimerId;

    /// Cancel a timer. Unknown or finished timers are ignored.
    fn cancel(&self, timer: TimerId);

    /// Whether the timer is still scheduled.
    fn is_active(&self, timer: TimerId) -> bool;
}

impl<T: TimerFacility + ?Sized> TimerFacility for Arc<T> {
    fn start(&self, duration: TimeDelta, on_elapsed: ElapsedCallback) -> TimerId {
        (**self).start(duration, on_elapsed)
    }

    fn cancel(&self, timer: TimerId) {
        (**self).cancel(timer);
    }

    fn is_active(&self, timer: TimerId) -> bool {
        (**self).is_active(timer)
    }
}
