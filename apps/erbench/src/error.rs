//! # Error Module
//!
//! Application-level errors: everything that can go wrong around the core
//! evaluator (file loading, strict validation, serving).

use erbench_core::PartitionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the CLI and server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file did not contain the expected JSON.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A universe file could not be interpreted.
    #[error("invalid universe file {path}: {reason}")]
    Universe { path: PathBuf, reason: String },

    /// Strict mode rejected a malformed partition.
    #[error("{which} partition rejected: {source}")]
    InvalidPartition {
        which: &'static str,
        #[source]
        source: PartitionError,
    },

    /// Invalid option combination or value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The HTTP server failed to bind or serve.
    #[error("server error: {0}")]
    Server(#[source] std::io::Error),
}

/// Result alias used throughout the app.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
