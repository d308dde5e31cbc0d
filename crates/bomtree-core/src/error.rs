//! Error types for the engine.
//!
//! Data-shape problems in the input never surface here; they are reported
//! as [`BuildWarning`](crate::BuildWarning)s. These errors are reserved for
//! caller mistakes and I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when querying the hierarchy or loading inputs.
#[derive(Error, Debug)]
pub enum BomError {
    #[error("node '{0}' is not in the index")]
    NodeNotFound(String),

    #[error("design '{0}' is not in the index")]
    DesignNotFound(String),

    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, BomError>;
