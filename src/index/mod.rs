//! Index Reconciler subsystem for docbind
//!
//! Converges a collection's live indexes to a model's declared set at
//! schema-registration time.
//!
//! # Design Principles
//!
//! - Declared sets are merged and deduplicated before comparison
//! - Specs are compared by content; names are labels, not identity
//! - Live state is listed fresh on every pass, never cached
//! - Drops are gated by policy; creates always apply
//! - No rollback: index operations are not transactional downstream
//!
//! # Invariants
//!
//! - The implicit `_id_` primary-key index is never touched
//! - Drops execute before creates
//! - Reconciling a converged collection is a no-op

mod errors;
mod plan;
mod reconciler;
mod spec;

pub use errors::{IndexSyncError, SyncResult};
pub use plan::{plan, ReconciliationPlan};
pub use reconciler::{IndexReconciler, SyncPolicy, SyncReport};
pub use spec::{
    merge_declared, IndexDirection, IndexField, IndexOptions, IndexSpec, LiveIndex,
};
