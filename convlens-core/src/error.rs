//! Error types for convlens-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the convlens-core library
#[derive(Error, Debug)]
pub enum Error {
    /// No candidate location held a store file
    #[error("conversation store not found (searched {} location(s))", searched.len())]
    StoreNotFound { searched: Vec<PathBuf> },

    /// The store exists but could not be opened as a database
    #[error("cannot open conversation store at {}: {source}", path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A query was rejected by the store
    #[error("query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    /// A table the reports rely on is missing or has an unexpected shape
    #[error("schema mismatch on table {table}: {source}")]
    SchemaMismatch {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure to turn a stored payload into a [`crate::ConversationData`].
///
/// Always recoverable: callers skip the offending record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },
}

impl DecodeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        DecodeError::MalformedPayload {
            reason: reason.into(),
        }
    }
}

/// Result type alias for convlens-core
pub type Result<T> = std::result::Result<T, Error>;
