//! Storage result types
//!
//! Defines the metadata records returned by storage operations.

use serde::Serialize;
use std::time::SystemTime;

/// Kind of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    File,
    Directory,
    /// Symlinks, devices, sockets and fifos
    Unknown,
}

/// Metadata snapshot of one entry, taken at construction time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    pub name: String,
    pub fullpath: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub mime_type: String,
    pub modify_time: SystemTime,
}

impl FileStat {
    pub fn is_directory(&self) -> bool {
        self.file_type == FileType::Directory
    }
}
