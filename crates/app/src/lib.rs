//! # tickhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** the hosting engine implements (driven/outbound ports):
//!   - `TriggerSink` — accepts canonical trigger descriptors
//!   - `TimerFacility` — starts, cancels and queries timers
//! - Define **driving/inbound** use-cases:
//!   - `TriggerService` — `every`, `cron`, `changed` registration
//!   - `DelayGate` — feeds raw changes through the delay records
//! - Provide **in-process infrastructure** that doesn't need IO
//!   (the delay table, a tokio-backed timer facility)
//!
//! ## Dependency rule
//! Depends on `tickhub-domain` only (plus `tokio` for timers and channels).
//! The hosting engine depends on *this* crate, not the reverse.

pub mod delay_gate;
pub mod delay_table;
pub mod ports;
pub mod services;
pub mod timers;
