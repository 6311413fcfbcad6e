//! # Composition Errors
//!
//! Failures raised while merging update operators. Composition fails
//! before any I/O occurs, so a rejected update never partially writes.

use thiserror::Error;

use crate::collection::CollectionError;
use crate::operators::ValidationError;

/// Two incompatible operator kinds target the same field path.
///
/// Silently picking one would corrupt semantics, so composition fails
/// fast and names both.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conflicting update operators on `{path}`: {first} and {second}")]
pub struct ConflictingUpdateError {
    /// The contested field path
    pub path: String,
    /// Operator keyword already holding the path
    pub first: String,
    /// Operator keyword that collided
    pub second: String,
}

/// A failed composition
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComposeError {
    /// Incompatible operator kinds on one path
    #[error(transparent)]
    Conflict(#[from] ConflictingUpdateError),

    /// A malformed operand surfaced while rendering an operator
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A failed update: composition or the driver call itself
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The update document could not be composed; nothing was written
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// The driver rejected the update
    #[error(transparent)]
    Collection(#[from] CollectionError),
}
