//! # Index Sync Errors
//!
//! Failures surfaced while converging live indexes to a declared set.
//! Reconciliation does not roll back already-applied changes: index
//! operations are not transactional in the target database and are not
//! modeled as atomic here.

use thiserror::Error;

use crate::collection::CollectionError;

/// Result type for reconciliation
pub type SyncResult<T> = Result<T, IndexSyncError>;

/// A rejected index operation, carrying the offending index name and the
/// underlying driver cause
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexSyncError {
    /// The live index listing could not be read
    #[error("failed to list indexes: {source}")]
    List {
        #[source]
        source: CollectionError,
    },

    /// A create call was rejected
    #[error("failed to create index `{name}`: {source}")]
    Create {
        name: String,
        #[source]
        source: CollectionError,
    },

    /// A drop call was rejected
    #[error("failed to drop index `{name}`: {source}")]
    Drop {
        name: String,
        #[source]
        source: CollectionError,
    },
}

impl IndexSyncError {
    /// Returns the offending index name, when the failure concerns one
    pub fn index_name(&self) -> Option<&str> {
        match self {
            IndexSyncError::List { .. } => None,
            IndexSyncError::Create { name, .. } | IndexSyncError::Drop { name, .. } => Some(name),
        }
    }
}
