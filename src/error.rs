// src/error.rs
//! Error taxonomy for one poll cycle.
//!
//! `FetchError`, `ParseError` and `StoreError` abort a run before the
//! snapshot is replaced. `DispatchError` is per entity and only ever ends up
//! in the run report.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reaching the data source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// The payload arrived but its header cannot be resolved.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("payload has no header row")]
    NoHeader,

    #[error("column '{column}' not found in header {header:?}")]
    MissingColumn { column: String, header: Vec<String> },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A single notification failed to reach the push provider.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("push request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("push provider answered HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Conditions that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("another run holds {0}")]
    Locked(PathBuf),
}
