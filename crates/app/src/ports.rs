//! Port definitions — traits the hosting engine implements.
//!
//! Ports are the boundaries between the trigger core and the engine that
//! owns rule registration and scheduling. The core only calls into them and
//! never assumes exclusive ownership.

pub mod timer;
pub mod trigger_sink;

pub use timer::{ElapsedCallback, TimerFacility};
pub use trigger_sink::TriggerSink;
