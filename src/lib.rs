// src/lib.rs
//! Carnabot poller: watch the published block sheet and push an alert
//! whenever a known block changes location or time.
//!
//! ```text
//! fetch (HttpSource) → parse → diff vs SnapshotStore → compose → dispatch → save
//! ```
//! One call to [`runner::run`] is one poll cycle; scheduling is external.

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

pub mod cli;
pub mod config;
pub mod core;
pub mod error;

pub mod compose;
pub mod csv;
pub mod diff;
pub mod dispatch;
pub mod fetch;
pub mod progress;
pub mod runner;
pub mod snapshot;
pub mod store;

pub use error::{ConfigError, DispatchError, FetchError, ParseError, RunError, StoreError};
pub use runner::{run, EntityReport, Outcome, RunReport};
pub use snapshot::{Entry, Field, Snapshot};
