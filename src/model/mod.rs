//! Model subsystem for docbind
//!
//! Immutable model descriptors and the startup-populated registry.
//!
//! # Design Principles
//!
//! - Descriptors are explicit schema descriptions built once per type,
//!   not runtime reflection
//! - The registry is an object with a documented lifecycle: populated at
//!   startup, read-only thereafter, passed by reference
//! - Registration reconciles declared indexes before the model is served

mod descriptor;
mod errors;
mod registry;

pub use descriptor::{LinkKind, ModelDescriptor, ModelDescriptorBuilder, REVISION_FIELD};
pub use errors::{ModelError, RegistryError};
pub use registry::ModelRegistry;
