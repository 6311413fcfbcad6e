//! Collection handle subsystem for docbind
//!
//! The database collaborator's interface, as consumed by the core.
//!
//! # Design Principles
//!
//! - Narrow surface: list/create/drop index, run query, run update
//! - Sessions and bulk writers pass through per call, never retained
//! - Driver failures are opaque; no retries in the core

mod errors;
mod handle;

pub use errors::{CollectionError, CollectionResult};
pub use handle::{CollectionHandle, DocumentCursor, UpdateOutcome};
