//! Log store implementations for Socio.

pub mod file_backend;
pub mod in_memory;

pub use file_backend::FileLogStore;
pub use in_memory::InMemoryLogStore;

use socio_core::{LogId, StoreError};
use socio_security::sanitize_reference;

/// Resolve a client reference to a [`LogId`], or report it as not found.
pub(crate) fn resolve_reference(reference: &str) -> Result<LogId, StoreError> {
    sanitize_reference(reference)
        .ok()
        .and_then(LogId::parse)
        .ok_or_else(|| StoreError::NotFound(reference.to_string()))
}
