//! Error types for the GCMD keyword cache.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the keyword cache's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for keyword cache operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A fetched or cached payload is not an acceptable SKOS document
    #[error("Invalid document for scheme {scheme}: {reason}")]
    InvalidDocument { scheme: String, reason: String },

    /// Cache directory unreadable or unwritable
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Non-success HTTP status, missing credentials, or a failed request
    #[error("Transport error: {0}")]
    Transport(String),

    /// Ancestor walk exceeded the concept count of the scheme
    #[error("Cycle detected in scheme {scheme} while resolving ancestors of {concept_id} ({steps} steps)")]
    CycleDetected {
        scheme: String,
        concept_id: String,
        steps: usize,
    },

    /// A broader reference points at a concept absent from the snapshot
    #[error("Dangling reference in scheme {scheme}: {concept_id} -> {missing_id}")]
    DanglingReference {
        scheme: String,
        concept_id: String,
        missing_id: String,
    },

    /// Scheme name not present in the registry
    #[error("Unknown scheme: {0}")]
    UnknownScheme(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed outside the cache store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a storage error with path context.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid document error.
    pub fn invalid_document(scheme: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            scheme: scheme.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}
