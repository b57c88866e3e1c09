//! Error types
//!
//! Defines domain-specific error types for the storage engine and the upload adapter.
//! Path payloads are always principal-relative; absolute host paths never leak
//! through error messages.

use std::io;
use thiserror::Error;

/// Storage engine errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The path would resolve outside the principal's sandbox root
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid principal: {0}")]
    InvalidPrincipal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Directory not empty: {0}")]
    NotEmpty(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Fieldless category of a [`StorageError`], for callers that branch on the kind only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidPath,
    InvalidPrincipal,
    NotFound,
    AlreadyExists,
    NotADirectory,
    NotEmpty,
    IoFailure,
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::InvalidPath(_) => ErrorKind::InvalidPath,
            StorageError::InvalidPrincipal(_) => ErrorKind::InvalidPrincipal,
            StorageError::NotFound(_) => ErrorKind::NotFound,
            StorageError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            StorageError::NotADirectory(_) => ErrorKind::NotADirectory,
            StorageError::NotEmpty(_) => ErrorKind::NotEmpty,
            StorageError::Io { .. } => ErrorKind::IoFailure,
        }
    }
}

/// Upload adapter errors
#[derive(Debug, Error)]
pub enum UploadError {
    /// The inbound transfer was cancelled before the write completed
    #[error("Upload aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
