//! # Camera Trap Sorter
//!
//! Reads camera-trap image folders, groups images into trigger events and
//! sorts them by species.
//!
//! ## Core Philosophy
//! - **Never touch the originals** - output is links or copies in new folders
//! - **Bad files are skipped, not fatal** - one corrupt JPEG never sinks a scan
//! - **Stay responsive** - all work happens on one background worker that
//!   can be paused, resumed and told to drop a directory at any time
//!
//! ## Architecture
//! - `core` - metadata decoding, event grouping, work tree and pipeline
//! - `events` - notifications from the worker (GUI-ready)
//! - `error` - error types

pub mod core;
pub mod error;
pub mod events;

pub use error::{Result, TrapError};

/// Install an `EnvFilter`-driven fmt subscriber (configured via `RUST_LOG`).
///
/// Fails if a global subscriber is already set.
pub fn init_tracing() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| TrapError::Config(format!("failed to install tracing subscriber: {}", e)))
}
