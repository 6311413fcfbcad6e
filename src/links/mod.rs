//! Link Resolver subsystem for docbind
//!
//! Rewrites query paths that address reference fields into the on-wire
//! path of the stored reference representation.
//!
//! # Design Principles
//!
//! - Exact shape matching: two segments, declared reference root,
//!   literal `id` tail; nothing else rewrites
//! - Recursive over the typed expression tree and raw nested documents
//! - Pure: returns a new expression, never mutates the input
//! - Lenient by default; strict validation is opt-in

mod errors;
mod resolver;

pub use errors::UnresolvedLinkError;
pub use resolver::{LinkResolver, ReadMode};
