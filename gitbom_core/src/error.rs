//! Error types for gitbom_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using gitbom_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while hashing, building or storing artifact trees.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred while reading content or touching the store.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Identifier text is not 40 or 64 lower-case hex characters.
    #[error("Invalid identifier: {reason}")]
    InvalidIdentifier { reason: String },

    /// Streamed content did not match its declared length.
    #[error("Content length mismatch: declared {expected} bytes, read {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    /// A canonical tree line could not be parsed.
    #[error("Invalid tree entry: {reason}")]
    InvalidTreeEntry { reason: String },

    /// Store is invalid or not initialized.
    #[error("Invalid store at {path}: {reason}")]
    InvalidStore { path: PathBuf, reason: String },

    /// Object not found in store.
    #[error("Object not found: {identifier}")]
    ObjectNotFound { identifier: String },

    /// Stored object does not hash to its own name.
    #[error("Corrupted object at {path}: {reason}")]
    CorruptedObject { path: PathBuf, reason: String },

    /// Unsupported algorithm.
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },
}

impl Error {
    /// Create an InvalidIdentifier error.
    pub fn invalid_identifier(reason: impl Into<String>) -> Self {
        Error::InvalidIdentifier {
            reason: reason.into(),
        }
    }

    /// Create a LengthMismatch error.
    pub fn length_mismatch(expected: u64, actual: u64) -> Self {
        Error::LengthMismatch { expected, actual }
    }

    /// Create an InvalidTreeEntry error.
    pub fn invalid_tree_entry(reason: impl Into<String>) -> Self {
        Error::InvalidTreeEntry {
            reason: reason.into(),
        }
    }

    /// Create an InvalidStore error.
    pub fn invalid_store(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an ObjectNotFound error.
    pub fn object_not_found(identifier: impl Into<String>) -> Self {
        Error::ObjectNotFound {
            identifier: identifier.into(),
        }
    }

    /// Create a CorruptedObject error.
    pub fn corrupted_object(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptedObject {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }
}

// Additional From implementations for external error types

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}

impl From<ignore::Error> for Error {
    fn from(err: ignore::Error) -> Self {
        // ignore::Error can wrap an io::Error or be a path/loop error
        match err.io_error() {
            Some(io_err) => Error::Io {
                source: std::io::Error::new(io_err.kind(), io_err.to_string()),
            },
            None => Error::Io {
                source: std::io::Error::other(err.to_string()),
            },
        }
    }
}
