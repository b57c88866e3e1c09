//! Principal identifiers
//!
//! The principal id becomes a directory name under `<root>/files`, so it must be
//! a single, plain path component.

use std::fmt;

use crate::error::StorageError;

const MAX_PRINCIPAL_LENGTH: usize = 255;

/// Authenticated owner of one sandbox root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal(String);

/// Performs basic input sanitation on the identifier.
fn is_valid_component(input: &str) -> bool {
    !input.trim().is_empty()
        && input.len() <= MAX_PRINCIPAL_LENGTH
        && input != "."
        && input != ".."
        && !input.contains(['/', '\\', '\0', '\r', '\n'])
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Result<Self, StorageError> {
        let id = id.into();
        if is_valid_component(&id) {
            Ok(Self(id))
        } else {
            Err(StorageError::InvalidPrincipal(id))
        }
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
