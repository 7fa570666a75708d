//! Error types for the attendance library.
//!
//! Missing documents are not errors (see [`crate::storage::Loaded`]);
//! everything else that can go wrong surfaces as an [`AttendanceError`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the ledger, storage adapter and report queries.
#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("unknown class: {0}")]
    UnknownClass(String),

    #[error("student '{student}' is not on the roster of class '{class}'")]
    UnknownStudent { class: String, student: String },

    #[error("duplicate class in roster: {0}")]
    DuplicateClass(String),

    #[error("duplicate student '{student}' in class '{class}'")]
    DuplicateStudent { class: String, student: String },

    #[error("failed to read {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for attendance operations.
pub type Result<T> = std::result::Result<T, AttendanceError>;
