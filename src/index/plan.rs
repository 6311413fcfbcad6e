//! Reconciliation planning
//!
//! Pure diff of a merged declared index set against a live listing.
//! The plan is transient: computed, executed once, discarded.

use super::spec::{IndexSpec, LiveIndex};

/// Actions that converge a collection's indexes to the declared set.
///
/// `to_create` and `to_drop` are disjoint by construction: a changed index
/// appears in `to_drop` under its old content and in `to_create` under its
/// new content, sharing the same name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationPlan {
    /// Declared specs absent from, or inconsistent with, the live set
    pub to_create: Vec<IndexSpec>,
    /// Live index names not in, or inconsistent with, the declared set
    pub to_drop: Vec<String>,
}

impl ReconciliationPlan {
    /// Returns true when the live set already equals the declared set
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_drop.is_empty()
    }
}

/// Diffs a merged declared set against the live listing.
///
/// The implicit `_id_` primary-key index is never touched. A live index is
/// dropped when no declared spec shares its name, or a same-named spec
/// differs in content. A declared spec is created when no live index
/// matches it in both name and content.
pub fn plan(declared: &[IndexSpec], live: &[LiveIndex]) -> ReconciliationPlan {
    let mut out = ReconciliationPlan::default();

    for live_index in live.iter().filter(|l| !l.is_primary()) {
        let keep = declared
            .iter()
            .any(|spec| spec.resolved_name() == live_index.name && live_index.matches_spec(spec));
        if !keep {
            out.to_drop.push(live_index.name.clone());
        }
    }

    for spec in declared {
        let name = spec.resolved_name();
        let satisfied = live
            .iter()
            .any(|l| l.name == name && l.matches_spec(spec));
        if !satisfied {
            out.to_create.push(spec.clone());
        }
    }

    out
}
