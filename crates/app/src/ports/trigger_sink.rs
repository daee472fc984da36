//! Trigger sink port — where canonical descriptors are registered.

use std::sync::Arc;

use tickhub_domain::error::TickHubError;
use tickhub_domain::id::TriggerId;
use tickhub_domain::trigger::TriggerDescriptor;

/// Accepts trigger descriptors from the core.
///
/// Each logical trigger is registered exactly once; the returned identity
/// keys any delay record attached to it.
pub trait TriggerSink {
    /// Register a descriptor and return the identity the engine assigned.
    ///
    /// # Errors
    ///
    /// Returns whatever the engine reports when it refuses the descriptor.
    fn register(&self, descriptor: TriggerDescriptor) -> Result<TriggerId, TickHubError>;
}

impl<T: TriggerSink + ?Sized> TriggerSink for Arc<T> {
    fn register(&self, descriptor: TriggerDescriptor) -> Result<TriggerId, TickHubError> {
        (**self).register(descriptor)
    }
}
