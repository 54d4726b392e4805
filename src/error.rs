//! Error types for the state subsystem
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == State Error Enum ==
/// Unified error type for key persistence and refresh reporting.
#[derive(Error, Debug)]
pub enum StateError {
    /// Filesystem failure while reading or writing a record
    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Category or identifier that cannot be mapped to a record file
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Value could not be encoded for persistence
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StateError {
    /// Wraps an I/O error together with the path it concerns.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StateError::Storage {
            path: path.into(),
            source,
        }
    }
}

// == Refresh Error ==
/// A refresh callback that failed for `key`.
///
/// Delivered asynchronously through the scheduler's failure channel, since
/// `schedule` has already returned by the time the callback runs.
#[derive(Error, Debug)]
#[error("Refresh failed for {key}: {source}")]
pub struct RefreshError {
    pub key: String,
    #[source]
    pub source: anyhow::Error,
}

// == Result Type Alias ==
/// Convenience Result type for the state subsystem.
pub type Result<T> = std::result::Result<T, StateError>;
