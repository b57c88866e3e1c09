//! Error handlers
//!
//! Maps raw OS errors onto storage error kinds.

use crate::error::types::StorageError;
use std::io;

/// Classify an I/O error raised while operating on `path` (principal-relative)
pub fn classify_io_error(err: io::Error, path: &str) -> StorageError {
    let path = path.to_string();
    match err.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(path),
        io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path),
        io::ErrorKind::NotADirectory => StorageError::NotADirectory(path),
        io::ErrorKind::DirectoryNotEmpty => StorageError::NotEmpty(path),
        _ => StorageError::Io { path, source: err },
    }
}
