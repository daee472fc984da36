//! Registration table of delay records, keyed by trigger identity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tickhub_domain::id::TriggerId;
use tickhub_domain::trigger::TriggerDelay;

/// A delay record behind its own lock.
///
/// Every change and every elapsed timer for one trigger is processed under
/// this lock, so timer cancel/start and the tracked state move together.
pub type DelayRecord = Arc<Mutex<TriggerDelay>>;

/// Shared table of [`TriggerDelay`] records.
///
/// Cloning is cheap and yields a handle to the same table.
#[derive(Debug, Clone, Default)]
pub struct DelayTable {
    records: Arc<Mutex<HashMap<TriggerId, DelayRecord>>>,
}

impl DelayTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, trigger_id: TriggerId, delay: TriggerDelay) {
        lock(&self.records).insert(trigger_id, Arc::new(Mutex::new(delay)));
    }

    #[must_use]
    pub fn get(&self, trigger_id: TriggerId) -> Option<DelayRecord> {
        lock(&self.records).get(&trigger_id).cloned()
    }

    /// Drop the record. A running timer is left untouched.
    pub fn remove(&self, trigger_id: TriggerId) -> Option<DelayRecord> {
        lock(&self.records).remove(&trigger_id)
    }

    #[must_use]
    pub fn contains(&self, trigger_id: TriggerId) -> bool {
        lock(&self.records).contains_key(&trigger_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use tickhub_domain::entity::State;

    fn delay() -> TriggerDelay {
        TriggerDelay::new(Some(State::On), None, TimeDelta::seconds(30))
    }

    #[test]
    fn should_share_records_between_clones() {
        let table = DelayTable::new();
        let other = table.clone();
        let id = TriggerId::new();
        table.insert(id, delay());
        assert!(other.contains(id));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn should_return_same_record_on_repeated_lookup() {
        let table = DelayTable::new();
        let id = TriggerId::new();
        table.insert(id, delay());
        let a = table.get(id).unwrap();
        let b = table.get(id).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn should_remove_record() {
        let table = DelayTable::new();
        let id = TriggerId::new();
        table.insert(id, delay());
        assert!(table.remove(id).is_some());
        assert!(table.is_empty());
        assert!(table.get(id).is_none());
    }

    #[test]
    fn should_return_none_for_unknown_trigger() {
        assert!(DelayTable::new().get(TriggerId::new()).is_none());
    }
}
