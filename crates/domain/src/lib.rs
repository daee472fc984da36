//! # tickhub-domain
//!
//! Pure domain model for the tickhub temporal trigger subsystem.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions
//! - Define **time values** (`TimeOfDay`, zoned timestamps, duration helpers)
//! - Define the **coercion protocol** shared by every temporal-like value
//! - Compile symbolic intervals into six-field **cron expressions**
//! - Define **trigger descriptors** and the **delay gate** record
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app` or external IO crates.
//! Timers and trigger registration are expressed as traits in the `app`
//! crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod cron;
pub mod entity;
pub mod event;
pub mod temporal;
pub mod trigger;
