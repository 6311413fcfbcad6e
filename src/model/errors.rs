//! # Model Errors
//!
//! Declaration-time and registration-time failures for document models.

use thiserror::Error;

use crate::index::IndexSyncError;

/// A malformed model declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Collection name was empty
    #[error("collection name must not be empty")]
    EmptyCollectionName,

    /// Field or link name was empty or contained a path separator
    #[error("invalid field name `{name}`: must be non-empty and contain no `.`")]
    InvalidFieldName { name: String },

    /// The same field or link name was declared twice
    #[error("field `{name}` is declared twice")]
    DuplicateField { name: String },
}

/// A failed model registration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A model is already registered for the collection
    #[error("a model is already registered for collection `{collection}`")]
    DuplicateModel { collection: String },

    /// The handle addresses a different collection than the descriptor
    #[error("descriptor targets collection `{expected}` but the handle is for `{got}`")]
    CollectionMismatch { expected: String, got: String },

    /// Index reconciliation failed during registration
    #[error(transparent)]
    Sync(#[from] IndexSyncError),
}
