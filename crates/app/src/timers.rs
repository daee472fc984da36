//! In-process timer facility backed by tokio tasks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::TimeDelta;
use tokio::task::AbortHandle;

use tickhub_domain::id::TimerId;

use crate::delay_table::lock;
use crate::ports::{ElapsedCallback, TimerFacility};

/// [`TimerFacility`] that runs each timer as a sleeping tokio task.
///
/// A timer is active from [`start`](TimerFacility::start) until its task
/// begins delivering the callback or it is cancelled.
#[derive(Debug, Clone, Default)]
pub struct TokioTimers {
    handles: Arc<Mutex<HashMap<TimerId, AbortHandle>>>,
}

impl TokioTimers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers still scheduled.
    #[must_use]
    pub fn active_count(&self) -> usize {
        lock(&self.handles).len()
    }
}

impl TimerFacility for TokioTimers {
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    fn start(&self, duration: TimeDelta, on_elapsed: ElapsedCallback) -> TimerId {
        let id = TimerId::new();
        // Negative durations elapse immediately.
        let sleep_for = duration.to_std().unwrap_or_default();
        let handles = Arc::clone(&self.handles);
        // Held across spawn so the task cannot remove its entry before it exists.
        let mut guard = lock(&self.handles);
        let task = tokio::spawn(async move {
            tokio::time::sleep(sleep_for).await;
            lock(&handles).remove(&id);
            on_elapsed(id);
        });
        guard.insert(id, task.abort_handle());
        tracing::trace!(timer = %id, ?sleep_for, "timer started");
        id
    }

    fn cancel(&self, timer: TimerId) {
        if let Some(handle) = lock(&self.handles).remove(&timer) {
            handle.abort();
            tracing::trace!(%timer, "timer cancelled");
        }
    }

    fn is_active(&self, timer: TimerId) -> bool {
        lock(&self.handles).contains_key(&timer)
    }
}
