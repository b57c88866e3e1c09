//! File system storage management
//!
//! Handles principal sandboxes, path validation and the file operations
//! performed inside them.

pub mod filesystem;
pub mod operations;
pub mod principal;
pub mod results;
pub mod validation;

// Re-export commonly used types
pub use operations::StorageEngine;
pub use principal::Principal;
pub use results::{FileStat, FileType};
pub use validation::{PathResolver, ResolvedPath};
