//! Operator Model subsystem for docbind
//!
//! Typed query and update operator nodes rendering to native BSON documents.
//!
//! # Design Principles
//!
//! - Immutable value objects: composing expressions builds new trees
//! - Pure rendering: deterministic output, no side effects, no I/O
//! - Empty operand sets are no-ops and render empty documents
//! - Operand validation at render time, where descriptor context lives
//! - Database-specific operators pass through opaquely as raw documents

mod errors;
mod query;
mod update;

pub use errors::{RenderResult, ValidationError};
pub use query::{CompareOp, Comparison, Expression, TextSearch};
pub use update::{UpdateKind, UpdateOp};
