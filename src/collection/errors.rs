//! # Collection Errors
//!
//! The opaque driver failure surfaced by `CollectionHandle` implementations.
//! The core never inspects it beyond the message; retry policy belongs to
//! the collaborator that owns the connection.

use thiserror::Error;

/// Result type for collection handle operations
pub type CollectionResult<T> = Result<T, CollectionError>;

/// An opaque failure reported by the underlying driver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("collection driver error: {message}")]
pub struct CollectionError {
    message: String,
}

impl CollectionError {
    /// Wraps a driver failure message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the driver message
    pub fn message(&self) -> &str {
        &self.message
    }
}
