//! Error handling
//!
//! Defines error types and handling for the storage engine.

pub mod handlers;
pub mod types;

pub use handlers::classify_io_error;
pub use types::*;
