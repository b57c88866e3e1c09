//! Transfer module
//!
//! Streaming copy primitives and the upload adapter that bridges an inbound
//! byte stream, with its abort notification, to the storage engine.

pub mod abort;
pub mod file_ops;
pub mod results;
pub mod upload;

// Re-export key types and functions
pub use abort::{AbortHandle, AbortSignal, abort_channel};
pub use file_ops::{FileReader, copy_stream};
pub use results::{UploadDescriptor, UploadedFile};
pub use upload::UploadAdapter;
