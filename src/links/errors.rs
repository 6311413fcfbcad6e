//! # Link Resolution Errors
//!
//! Reported only by strict resolution. The default resolver passes
//! unrecognized path shapes through unchanged.

use thiserror::Error;

/// A query path that addresses a declared reference field with a shape the
/// resolver does not recognize
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query path `{path}` addresses reference field `{field}` with an unrecognized shape")]
pub struct UnresolvedLinkError {
    /// The offending full path
    pub path: String,
    /// The declared reference field at the root of the path
    pub field: String,
}
