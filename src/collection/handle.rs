//! Collection handle abstraction
//!
//! The narrow interface the core consumes from the database collaborator.
//! Implementations own connection lifetime, cancellation, and retries; the
//! core never retains a handle, session, or bulk writer beyond a single
//! call.

use bson::Document;

use crate::index::{IndexSpec, LiveIndex};

use super::errors::CollectionResult;

/// A cursor over query results
pub type DocumentCursor = Box<dyn Iterator<Item = CollectionResult<Document>>>;

/// Outcome of an update call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Documents matched by the filter
    pub matched: u64,
    /// Documents actually modified
    pub modified: u64,
}

/// Operations the core needs from a collection.
///
/// `Session` and `BulkWriter` are opaque to the core: supplied by the
/// caller per call and handed straight through to the driver.
pub trait CollectionHandle {
    /// Driver session/transaction object
    type Session;
    /// Driver bulk-write accumulator
    type BulkWriter;

    /// Collection name
    fn name(&self) -> &str;

    /// Lists the indexes currently present. Queried fresh on every
    /// reconciliation pass, never cached by the core.
    fn list_indexes(&self) -> CollectionResult<Vec<LiveIndex>>;

    /// Creates an index from a declared spec
    fn create_index(&self, spec: &IndexSpec) -> CollectionResult<()>;

    /// Drops an index by name
    fn drop_index(&self, name: &str) -> CollectionResult<()>;

    /// Runs a query with a rendered filter document
    fn run_query(
        &self,
        filter: Document,
        session: Option<&mut Self::Session>,
    ) -> CollectionResult<DocumentCursor>;

    /// Runs an update with rendered filter and update documents
    fn run_update(
        &self,
        filter: Document,
        update: Document,
        session: Option<&mut Self::Session>,
        bulk_writer: Option<&mut Self::BulkWriter>,
    ) -> CollectionResult<UpdateOutcome>;
}
