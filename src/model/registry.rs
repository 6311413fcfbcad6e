//! Model registry
//!
//! Explicit registry of initialized models: populated once at startup,
//! read-only thereafter, passed by reference to whatever needs it. No
//! ambient global state.

use std::collections::HashMap;

use tracing::debug;

use crate::collection::CollectionHandle;
use crate::index::{IndexReconciler, SyncPolicy, SyncReport};

use super::descriptor::ModelDescriptor;
use super::errors::RegistryError;

/// Registry of initialized document models, keyed by collection name
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelDescriptor>,
}

impl ModelRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model and reconciles its declared indexes against the
    /// collection.
    ///
    /// Runs once per model at startup. A reconciliation failure aborts the
    /// registration; index state may be partially applied.
    pub fn register<H: CollectionHandle>(
        &mut self,
        descriptor: ModelDescriptor,
        handle: &H,
        policy: SyncPolicy,
    ) -> Result<SyncReport, RegistryError> {
        if handle.name() != descriptor.collection() {
            return Err(RegistryError::CollectionMismatch {
                expected: descriptor.collection().to_string(),
                got: handle.name().to_string(),
            });
        }
        if self.models.contains_key(descriptor.collection()) {
            return Err(RegistryError::DuplicateModel {
                collection: descriptor.collection().to_string(),
            });
        }

        let report = IndexReconciler::new(handle).sync(descriptor.indexes(), policy)?;
        debug!(
            collection = descriptor.collection(),
            created = report.created.len(),
            dropped = report.dropped.len(),
            "model registered"
        );
        self.models
            .insert(descriptor.collection().to_string(), descriptor);
        Ok(report)
    }

    /// Looks up the descriptor registered for a collection
    pub fn get(&self, collection: &str) -> Option<&ModelDescriptor> {
        self.models.get(collection)
    }

    /// Number of registered models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true when no model is registered
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionResult, DocumentCursor, UpdateOutcome};
    use crate::index::{IndexField, IndexOptions, IndexSpec, LiveIndex};
    use bson::Document;
    use std::cell::RefCell;

    struct MockCollection {
        name: String,
        live: RefCell<Vec<LiveIndex>>,
    }

    impl MockCollection {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                live: RefCell::new(vec![LiveIndex::new(
                    "_id_",
                    [IndexField::asc("_id")],
                    IndexOptions::default(),
                )]),
            }
        }
    }

    impl CollectionHandle for MockCollection {
        type Session = ();
        type BulkWriter = ();

        fn name(&self) -> &str {
            &self.name
        }

        fn list_indexes(&self) -> CollectionResult<Vec<LiveIndex>> {
            Ok(self.live.borrow().clone())
        }

        fn create_index(&self, spec: &IndexSpec) -> CollectionResult<()> {
            self.live.borrow_mut().push(LiveIndex::new(
                spec.resolved_name(),
                spec.keys().to_vec(),
                spec.options().clone(),
            ));
            Ok(())
        }

        fn drop_index(&self, name: &str) -> CollectionResult<()> {
            self.live.borrow_mut().retain(|l| l.name != name);
            Ok(())
        }

        fn run_query(
            &self,
            _filter: Document,
            _session: Option<&mut ()>,
        ) -> CollectionResult<DocumentCursor> {
            Ok(Box::new(std::iter::empty()))
        }

        fn run_update(
            &self,
            _filter: Document,
            _update: Document,
            _session: Option<&mut ()>,
            _bulk_writer: Option<&mut ()>,
        ) -> CollectionResult<UpdateOutcome> {
            Ok(UpdateOutcome::default())
        }
    }

    fn descriptor(collection: &str) -> ModelDescriptor {
        ModelDescriptor::builder(collection)
            .field("name")
            .index(IndexSpec::ascending("name"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_builds_indexes_and_stores_descriptor() {
        let handle = MockCollection::new("users");
        let mut registry = ModelRegistry::new();

        let report = registry
            .register(descriptor("users"), &handle, SyncPolicy::default())
            .unwrap();

        assert_eq!(report.created, vec!["name_1".to_string()]);
        assert!(registry.get("users").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let handle = MockCollection::new("users");
        let mut registry = ModelRegistry::new();

        registry
            .register(descriptor("users"), &handle, SyncPolicy::default())
            .unwrap();
        let err = registry
            .register(descriptor("users"), &handle, SyncPolicy::default())
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateModel {
                collection: "users".into()
            }
        );
    }

    #[test]
    fn test_mismatched_handle_is_rejected() {
        let handle = MockCollection::new("accounts");
        let mut registry = ModelRegistry::new();

        let err = registry
            .register(descriptor("users"), &handle, SyncPolicy::default())
            .unwrap_err();

        assert!(matches!(err, RegistryError::CollectionMismatch { .. }));
        assert!(registry.is_empty());
    }
}
