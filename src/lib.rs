//! Per-principal file storage engine
//!
//! Sandboxed directory listing, stat, create, read, write, move and delete on
//! the local filesystem, plus an upload adapter for inbound byte streams.

pub mod config;
pub mod error;
pub mod storage;
pub mod transfer;
pub mod utils;

pub use config::StorageConfig;
pub use error::{ErrorKind, StorageError, UploadError};
pub use storage::{FileStat, FileType, PathResolver, Principal, StorageEngine};
pub use transfer::{AbortHandle, AbortSignal, UploadAdapter, UploadDescriptor, UploadedFile};
