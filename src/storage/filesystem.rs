//! File system operations
//!
//! Low-level helpers shared by the storage operations: metadata queries and
//! their conversion into [`FileStat`] records.

use std::fs::Metadata;
use std::time::SystemTime;
use tokio::fs;

use crate::error::{StorageError, classify_io_error};
use crate::storage::results::{FileStat, FileType};
use crate::storage::validation::ResolvedPath;

pub const DIRECTORY_MIME: &str = "inode/directory";
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Classify metadata taken without following symlinks
pub fn file_type_of(metadata: &Metadata) -> FileType {
    let ft = metadata.file_type();
    if ft.is_file() {
        FileType::File
    } else if ft.is_dir() {
        FileType::Directory
    } else {
        FileType::Unknown
    }
}

/// MIME type for an entry, looked up from its extension
pub fn mime_type_for(name: &str, file_type: FileType) -> String {
    match file_type {
        FileType::Directory => DIRECTORY_MIME.to_string(),
        FileType::File | FileType::Unknown => mime_guess::from_path(name)
            .first_raw()
            .unwrap_or(DEFAULT_MIME)
            .to_string(),
    }
}

/// Build a [`FileStat`] from freshly queried metadata
pub fn file_stat_from(path: &ResolvedPath, metadata: &Metadata) -> FileStat {
    let file_type = file_type_of(metadata);
    let size = match file_type {
        FileType::Directory => 0,
        FileType::File | FileType::Unknown => metadata.len(),
    };

    FileStat {
        name: path.name().to_string(),
        fullpath: path.relative.clone(),
        size,
        file_type,
        mime_type: mime_type_for(path.name(), file_type),
        modify_time: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
    }
}

/// Query metadata for a resolved path; symlinks are reported, not followed
pub async fn stat_entry(path: &ResolvedPath) -> Result<FileStat, StorageError> {
    let metadata = fs::symlink_metadata(&path.absolute)
        .await
        .map_err(|e| classify_io_error(e, &path.relative))?;
    Ok(file_stat_from(path, &metadata))
}
