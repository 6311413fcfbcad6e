//! Index reconciler
//!
//! Converges a collection's live indexes to a model's declared set, once
//! per model at registration time.
//!
//! Destructive actions are gated: when drops are disallowed the whole drop
//! set is skipped and reported, while creates always apply. Additive
//! changes favor forward progress; stale indexes are only removed when
//! explicitly permitted.

use tracing::{debug, warn};

use crate::collection::CollectionHandle;

use super::errors::{IndexSyncError, SyncResult};
use super::plan::{plan, ReconciliationPlan};
use super::spec::{merge_declared, IndexSpec};

/// Reconciliation policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Permit dropping live indexes absent from the declared set.
    /// Defaults to false.
    pub allow_drop: bool,
}

impl SyncPolicy {
    /// Policy with the given drop permission
    pub fn new(allow_drop: bool) -> Self {
        Self { allow_drop }
    }
}

/// What a reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Index names created
    pub created: Vec<String>,
    /// Index names dropped
    pub dropped: Vec<String>,
    /// Drops withheld by policy
    pub skipped_drops: Vec<String>,
}

/// Converges live indexes to declared specs against one collection handle
pub struct IndexReconciler<'a, H: CollectionHandle> {
    handle: &'a H,
}

impl<'a, H: CollectionHandle> IndexReconciler<'a, H> {
    /// Creates a reconciler over a collection handle
    pub fn new(handle: &'a H) -> Self {
        Self { handle }
    }

    /// Computes the plan for a declared set against the current live
    /// listing, without executing anything
    pub fn plan(&self, declared: &[IndexSpec]) -> SyncResult<ReconciliationPlan> {
        let merged = merge_declared(declared.iter().cloned());
        let live = self
            .handle
            .list_indexes()
            .map_err(|source| IndexSyncError::List { source })?;
        Ok(plan(&merged, &live))
    }

    /// Plans and executes one reconciliation pass.
    ///
    /// Drops run before creates, so replacing a same-named index with
    /// different content is drop-then-create rather than an error. A failed
    /// individual operation aborts the pass; changes already applied stay
    /// applied.
    pub fn sync(&self, declared: &[IndexSpec], policy: SyncPolicy) -> SyncResult<SyncReport> {
        let plan = self.plan(declared)?;
        let mut report = SyncReport::default();

        if plan.is_empty() {
            debug!(collection = self.handle.name(), "indexes already converged");
            return Ok(report);
        }

        if !plan.to_drop.is_empty() && !policy.allow_drop {
            warn!(
                collection = self.handle.name(),
                skipped = plan.to_drop.len(),
                "index drops withheld by policy; creates still apply"
            );
            report.skipped_drops = plan.to_drop.clone();
        } else {
            for name in &plan.to_drop {
                self.handle
                    .drop_index(name)
                    .map_err(|source| IndexSyncError::Drop {
                        name: name.clone(),
                        source,
                    })?;
                debug!(collection = self.handle.name(), index = name.as_str(), "index dropped");
                report.dropped.push(name.clone());
            }
        }

        for spec in &plan.to_create {
            let name = spec.resolved_name();
            self.handle
                .create_index(spec)
                .map_err(|source| IndexSyncError::Create {
                    name: name.clone(),
                    source,
                })?;
            debug!(collection = self.handle.name(), index = name.as_str(), "index created");
            report.created.push(name);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{
        CollectionError, CollectionResult, DocumentCursor, UpdateOutcome,
    };
    use crate::index::spec::{IndexField, IndexOptions, LiveIndex};
    use bson::Document;
    use std::cell::RefCell;

    /// Records index calls and serves a preset live listing
    struct MockCollection {
        live: RefCell<Vec<LiveIndex>>,
        calls: RefCell<Vec<String>>,
        fail_create: Option<String>,
    }

    impl MockCollection {
        fn new(live: Vec<LiveIndex>) -> Self {
            Self {
                live: RefCell::new(live),
                calls: RefCell::new(Vec::new()),
                fail_create: None,
            }
        }

        fn failing_create(mut self, name: &str) -> Self {
            self.fail_create = Some(name.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl CollectionHandle for MockCollection {
        type Session = ();
        type BulkWriter = ();

        fn name(&self) -> &str {
            "sample"
        }

        fn list_indexes(&self) -> CollectionResult<Vec<LiveIndex>> {
            Ok(self.live.borrow().clone())
        }

        fn create_index(&self, spec: &IndexSpec) -> CollectionResult<()> {
            let name = spec.resolved_name();
            if self.fail_create.as_deref() == Some(name.as_str()) {
                return Err(CollectionError::new("index build failed"));
            }
            self.calls.borrow_mut().push(format!("create:{name}"));
            self.live.borrow_mut().push(LiveIndex::new(
                name,
                spec.keys().to_vec(),
                spec.options().clone(),
            ));
            Ok(())
        }

        fn drop_index(&self, name: &str) -> CollectionResult<()> {
            self.calls.borrow_mut().push(format!("drop:{name}"));
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

    fn primary() -> LiveIndex {
        LiveIndex::new("_id_", [IndexField::asc("_id")], IndexOptions::default())
    }

    #[test]
    fn test_creates_missing_indexes() {
        let mock = MockCollection::new(vec![primary()]);
        let declared = vec![IndexSpec::ascending("age")];

        let report = IndexReconciler::new(&mock)
            .sync(&declared, SyncPolicy::default())
            .unwrap();

        assert_eq!(report.created, vec!["age_1".to_string()]);
        assert_eq!(mock.calls(), vec!["create:age_1".to_string()]);
    }

    #[test]
    fn test_drop_gated_by_policy() {
        let stale = LiveIndex::new("x_1", [IndexField::asc("x")], IndexOptions::default());

        let mock = MockCollection::new(vec![primary(), stale.clone()]);
        let report = IndexReconciler::new(&mock)
            .sync(&[], SyncPolicy::default())
            .unwrap();
        assert_eq!(report.skipped_drops, vec!["x_1".to_string()]);
        assert!(report.dropped.is_empty());
        assert!(mock.calls().is_empty());

        let mock = MockCollection::new(vec![primary(), stale]);
        let report = IndexReconciler::new(&mock)
            .sync(&[], SyncPolicy::new(true))
            .unwrap();
        assert_eq!(report.dropped, vec!["x_1".to_string()]);
        assert_eq!(mock.calls(), vec!["drop:x_1".to_string()]);
    }

    #[test]
    fn test_creates_apply_even_when_drops_are_withheld() {
        let stale = LiveIndex::new("x_1", [IndexField::asc("x")], IndexOptions::default());
        let mock = MockCollection::new(vec![primary(), stale]);
        let declared = vec![IndexSpec::ascending("age")];

        let report = IndexReconciler::new(&mock)
            .sync(&declared, SyncPolicy::default())
            .unwrap();

        assert_eq!(report.created, vec!["age_1".to_string()]);
        assert_eq!(report.skipped_drops, vec!["x_1".to_string()]);
        assert_eq!(mock.calls(), vec!["create:age_1".to_string()]);
    }

    #[test]
    fn test_changed_index_is_replaced_drop_then_create() {
        let old = LiveIndex::new("name_1", [IndexField::asc("name")], IndexOptions::default());
        let mock = MockCollection::new(vec![primary(), old]);
        let declared = vec![IndexSpec::ascending("name").unique()];

        let report = IndexReconciler::new(&mock)
            .sync(&declared, SyncPolicy::new(true))
            .unwrap();

        assert_eq!(report.dropped, vec!["name_1".to_string()]);
        assert_eq!(report.created, vec!["name_1".to_string()]);
        assert_eq!(
            mock.calls(),
            vec!["drop:name_1".to_string(), "create:name_1".to_string()]
        );
    }

    #[test]
    fn test_sync_is_idempotent() {
        let mock = MockCollection::new(vec![primary()]);
        let declared = vec![IndexSpec::ascending("age"), IndexSpec::descending("name")];
        let reconciler = IndexReconciler::new(&mock);

        let first = reconciler.sync(&declared, SyncPolicy::new(true)).unwrap();
        assert_eq!(first.created.len(), 2);

        // Immediately after convergence the plan is empty.
        let second = reconciler.sync(&declared, SyncPolicy::new(true)).unwrap();
        assert_eq!(second, SyncReport::default());
    }

    #[test]
    fn test_failed_create_surfaces_spec_name() {
        let mock = MockCollection::new(vec![primary()]).failing_create("age_1");
        let declared = vec![IndexSpec::ascending("age")];

        let err = IndexReconciler::new(&mock)
            .sync(&declared, SyncPolicy::default())
            .unwrap_err();

        assert_eq!(err.index_name(), Some("age_1"));
    }

    #[test]
    fn test_declared_duplicates_merge_before_comparison() {
        let mock = MockCollection::new(vec![primary()]);
        let declared = vec![
            IndexSpec::ascending("name").unique(),
            IndexSpec::ascending("name").sparse(),
        ];

        let report = IndexReconciler::new(&mock)
            .sync(&declared, SyncPolicy::default())
            .unwrap();

        // One create, carrying the union of both option flags.
        assert_eq!(report.created, vec!["name_1".to_string()]);
        let live = mock.live.borrow();
        let created = live.iter().find(|l| l.name == "name_1").unwrap();
        assert!(created.options.unique);
        assert!(created.options.sparse);
    }
}
