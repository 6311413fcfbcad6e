//! Update Composer subsystem for docbind
//!
//! Combines update-operator invocations into one composite document and
//! optionally appends the revision stamp.
//!
//! # Design Principles
//!
//! - Disjoint paths merge freely; same kind on one path is last-write-wins
//! - Different kinds on one path fail fast; never silently pick one
//! - Revision stamps apply after user operators, so they are never
//!   overridden
//! - Composition is pure; a rejected update performs no I/O

mod builder;
mod composer;
mod errors;

pub use builder::UpdateBuilder;
pub use composer::UpdateComposer;
pub use errors::{ComposeError, ConflictingUpdateError, UpdateError};
