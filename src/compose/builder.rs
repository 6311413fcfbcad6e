//! Fluent update surface
//!
//! Chain methods accumulate operator invocations and hand the composed
//! document to the collection handle in one call. Session and bulk-writer
//! objects pass straight through; composition failures reject the update
//! before any I/O.

use bson::{Bson, Document};

use crate::collection::{CollectionHandle, UpdateOutcome};
use crate::model::ModelDescriptor;
use crate::operators::UpdateOp;

use super::composer::UpdateComposer;
use super::errors::{ComposeError, UpdateError};

/// Accumulates update operators against one collection and filter
pub struct UpdateBuilder<'a, H: CollectionHandle> {
    handle: &'a H,
    filter: Document,
    ops: Vec<UpdateOp>,
    composer: UpdateComposer,
}

impl<'a, H: CollectionHandle> UpdateBuilder<'a, H> {
    /// Builder without revision stamping
    pub fn new(handle: &'a H, filter: Document) -> Self {
        Self {
            handle,
            filter,
            ops: Vec::new(),
            composer: UpdateComposer::new(),
        }
    }

    /// Builder honoring the model's revision flag
    pub fn for_model(handle: &'a H, model: &ModelDescriptor, filter: Document) -> Self {
        Self {
            handle,
            filter,
            ops: Vec::new(),
            composer: UpdateComposer::for_model(model),
        }
    }

    /// Appends an arbitrary operator invocation
    pub fn op(mut self, op: UpdateOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Sets field values
    pub fn set(self, fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        self.op(UpdateOp::set(fields))
    }

    /// Removes fields
    pub fn unset(self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.op(UpdateOp::unset(paths))
    }

    /// Increments numeric fields
    pub fn inc(self, fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        self.op(UpdateOp::inc(fields))
    }

    /// Stamps fields with the server's current date
    pub fn current_date(self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.op(UpdateOp::current_date(paths))
    }

    /// Appends to arrays
    pub fn push(self, fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        self.op(UpdateOp::push(fields))
    }

    /// Removes matching array elements
    pub fn pull(self, fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        self.op(UpdateOp::pull(fields))
    }

    /// Appends to arrays unless already present
    pub fn add_to_set(
        self,
        fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>,
    ) -> Self {
        self.op(UpdateOp::add_to_set(fields))
    }

    /// Keeps the smaller of current and given values
    pub fn min(self, fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        self.op(UpdateOp::min(fields))
    }

    /// Keeps the larger of current and given values
    pub fn max(self, fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        self.op(UpdateOp::max(fields))
    }

    /// Multiplies numeric fields
    pub fn mul(self, fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        self.op(UpdateOp::mul(fields))
    }

    /// Composes the accumulated operators without running the update
    pub fn compose(&self) -> Result<Document, ComposeError> {
        self.composer.compose(self.ops.iter().cloned())
    }

    /// Composes and runs the update against the collection handle
    pub fn run(
        self,
        session: Option<&mut H::Session>,
        bulk_writer: Option<&mut H::BulkWriter>,
    ) -> Result<UpdateOutcome, UpdateError> {
        let update = self.composer.compose(self.ops)?;
        self.handle
            .run_update(self.filter, update, session, bulk_writer)
            .map_err(UpdateError::from)
    }
}
