//! Store and format error definitions.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::types::Domain;

/// Errors produced while encoding or decoding a document body.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("cannot encode TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("document root must be a table")]
    NotATable,
}

/// Errors that can occur in the configuration store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Domain tag not recognised.
    #[error("unknown domain '{0}'")]
    UnknownDomain(String),

    /// Category or locale is not a plain path segment.
    #[error("invalid path segment '{0}'")]
    InvalidSegment(String),

    #[error("domain {0} requires a locale")]
    LocaleRequired(Domain),

    #[error("domain {0} does not take a locale")]
    LocaleNotAllowed(Domain),

    /// Document or key does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io { path: path.into(), source }
    }

    /// Whether the error was caused by the caller's input rather than storage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::UnknownDomain(_)
                | StoreError::InvalidSegment(_)
                | StoreError::LocaleRequired(_)
                | StoreError::LocaleNotAllowed(_)
        )
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
