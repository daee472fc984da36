//! # tickhubd — tickhub daemon
//!
//! Composition root that registers configured trigger rules and replays
//! raw state changes read from stdin through them.
//!
//! ## Responsibilities
//! - Load configuration (`tickhub.toml`, env vars)
//! - Initialize `tracing` from the configured filter
//! - Construct the timer facility, the trigger service and the delay gate
//! - Register every `[[rules]]` entry
//! - Read `<target> <previous> <new>` lines from stdin and dispatch them
//! - Log fired and satisfied triggers
//! - Stop on end of input or Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod engine;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use tickhub_app::timers::TokioTimers;

use crate::config::Config;
use crate::engine::{Engine, parse_change};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let engine = Engine::new(Arc::new(TokioTimers::new()), config.gate.channel_capacity);
    let registered = engine.declare_all(&config.rules)?;
    tracing::info!(rules = config.rules.len(), triggers = registered, "tickhubd ready");

    let mut satisfied = engine.subscribe();
    tokio::spawn(async move {
        loop {
            match satisfied.recv().await {
                Ok(event) => {
                    tracing::info!(trigger_id = %event.trigger_id, state = %event.state, "delayed trigger fired");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "satisfied notifications dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("end of input");
                    break;
                };
                match parse_change(&line) {
                    Some(change) => {
                        if let Err(err) = engine.dispatch(&change) {
                            tracing::warn!(error = %err, "dispatch failed");
                        }
                    }
                    None if !line.trim().is_empty() && !line.trim_start().starts_with('#') => {
                        tracing::warn!(%line, "expected `<target> <previous> <new>`");
                    }
                    None => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}
