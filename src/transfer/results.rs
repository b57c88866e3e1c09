//! Transfer result types
//!
//! Defines the records exchanged with an upload handler.

use serde::Serialize;
use std::time::SystemTime;

/// Client-declared metadata of an inbound file; passed through unverified
#[derive(Debug, Clone, Default)]
pub struct UploadDescriptor {
    pub mime_type: String,
    pub original_name: String,
    pub encoding: String,
}

/// Stored upload: engine metadata merged with the client-declared fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Principal-relative path of the stored file
    pub path: String,
    pub size: u64,
    pub mime_type: String,
    /// Generated on-disk name
    pub filename: String,
    pub encoding: String,
    pub modify_time: SystemTime,
    pub original_name: String,
}
