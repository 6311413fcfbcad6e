//! docbind - a typed object-document mapping core for MongoDB-style
//! document stores
//!
//! Binds model descriptors to collections: reconciles declared indexes
//! with live collection state, rewrites reference-field query paths for
//! the stored link representation, and composes update operators into
//! conflict-free update documents.
//!
//! At registration time the index reconciler runs once per model against
//! its collection handle. At query/update time, caller-built expressions
//! pass through the link resolver (queries) and the update composer
//! (updates) before reaching the handle.

pub mod collection;
pub mod compose;
pub mod index;
pub mod links;
pub mod model;
pub mod operators;

pub use bson::{doc, Bson, Document};
