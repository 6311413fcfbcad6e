//! Index specifications
//!
//! Declared and live index descriptions compared by content. Two specs are
//! equivalent iff their key patterns (order-sensitive) and all options
//! match; the name is not part of equivalence. A name collision with a
//! content difference is a conflict requiring drop+recreate.

use bson::Document;
use serde::{Deserialize, Serialize};

/// Sort direction of one key-pattern entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexDirection {
    Ascending,
    Descending,
}

impl IndexDirection {
    /// Returns the wire-level direction value
    pub fn as_int(&self) -> i32 {
        match self {
            IndexDirection::Ascending => 1,
            IndexDirection::Descending => -1,
        }
    }

    /// Parses a wire-level direction value
    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(IndexDirection::Ascending),
            -1 => Some(IndexDirection::Descending),
            _ => None,
        }
    }
}

/// One (field, direction) entry of a key pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    /// Field path
    pub field: String,
    /// Sort direction
    pub direction: IndexDirection,
}

impl IndexField {
    /// Ascending key entry
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: IndexDirection::Ascending,
        }
    }

    /// Descending key entry
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: IndexDirection::Descending,
        }
    }
}

/// Option flags and parameters of an index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Reject duplicate key values
    #[serde(default)]
    pub unique: bool,
    /// Skip documents missing the indexed fields
    #[serde(default)]
    pub sparse: bool,
    /// Index only documents matching this filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_filter: Option<Document>,
    /// TTL: expire documents this many seconds after the indexed date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_after_secs: Option<i64>,
}

impl IndexOptions {
    /// Unions two option sets: flags are or-ed, parameters prefer the
    /// later declaration when both are present
    pub fn union(&self, later: &IndexOptions) -> IndexOptions {
        IndexOptions {
            unique: self.unique || later.unique,
            sparse: self.sparse || later.sparse,
            partial_filter: later.partial_filter.clone().or_else(|| self.partial_filter.clone()),
            expire_after_secs: later.expire_after_secs.or(self.expire_after_secs),
        }
    }
}

/// A declared index: named key pattern plus options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    keys: Vec<IndexField>,
    #[serde(default)]
    options: IndexOptions,
}

impl IndexSpec {
    /// Creates a spec from key-pattern entries with default options
    pub fn new(keys: impl IntoIterator<Item = IndexField>) -> Self {
        Self {
            name: None,
            keys: keys.into_iter().collect(),
            options: IndexOptions::default(),
        }
    }

    /// Single ascending-field spec
    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new([IndexField::asc(field)])
    }

    /// Single descending-field spec
    pub fn descending(field: impl Into<String>) -> Self {
        Self::new([IndexField::desc(field)])
    }

    /// Sets an explicit index name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the index unique
    pub fn unique(mut self) -> Self {
        self.options.unique = true;
        self
    }

    /// Marks the index sparse
    pub fn sparse(mut self) -> Self {
        self.options.sparse = true;
        self
    }

    /// Restricts the index to documents matching a filter
    pub fn with_partial_filter(mut self, filter: Document) -> Self {
        self.options.partial_filter = Some(filter);
        self
    }

    /// Sets a TTL in seconds
    pub fn with_expire_after_secs(mut self, secs: i64) -> Self {
        self.options.expire_after_secs = Some(secs);
        self
    }

    /// Replaces the full option set
    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the key-pattern entries
    pub fn keys(&self) -> &[IndexField] {
        &self.keys
    }

    /// Returns the option set
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Returns the explicit name, if one was declared
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the name this index carries on the wire: the explicit name,
    /// or the driver-style default `field1_1_field2_-1`
    pub fn resolved_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .keys
                .iter()
                .map(|k| format!("{}_{}", k.field, k.direction.as_int()))
                .collect::<Vec<_>>()
                .join("_"),
        }
    }

    /// Renders the key pattern as a wire-level document
    pub fn key_pattern_document(&self) -> Document {
        let mut out = Document::new();
        for key in &self.keys {
            out.insert(key.field.clone(), key.direction.as_int());
        }
        out
    }

    /// Order-sensitive key-pattern equality
    pub fn same_key_pattern(&self, other: &IndexSpec) -> bool {
        self.keys == other.keys
    }

    /// Content equivalence: key pattern and options; name excluded
    pub fn content_matches(&self, keys: &[IndexField], options: &IndexOptions) -> bool {
        self.keys == keys && &self.options == options
    }
}

/// An index currently present on a collection, as reported by the database
#[derive(Debug, Clone, PartialEq)]
pub struct LiveIndex {
    /// Index name
    pub name: String,
    /// Key-pattern entries
    pub keys: Vec<IndexField>,
    /// Option set
    pub options: IndexOptions,
}

impl LiveIndex {
    /// Creates a live-index listing entry
    pub fn new(
        name: impl Into<String>,
        keys: impl IntoIterator<Item = IndexField>,
        options: IndexOptions,
    ) -> Self {
        Self {
            name: name.into(),
            keys: keys.into_iter().collect(),
            options,
        }
    }

    /// The implicit primary-key index, never touched by reconciliation
    pub fn is_primary(&self) -> bool {
        self.name == "_id_"
    }

    /// Content equivalence against a declared spec
    pub fn matches_spec(&self, spec: &IndexSpec) -> bool {
        spec.content_matches(&self.keys, &self.options)
    }
}

/// Merges a declared index set: specs sharing a key pattern are unioned
/// into one spec with the union of their option flags, preserving
/// first-declaration order. Never silently duplicates.
pub fn merge_declared(specs: impl IntoIterator<Item = IndexSpec>) -> Vec<IndexSpec> {
    let mut merged: Vec<IndexSpec> = Vec::new();
    for spec in specs {
        match merged.iter_mut().find(|m| m.same_key_pattern(&spec)) {
            Some(existing) => {
                existing.options = existing.options.union(&spec.options);
                if spec.name.is_some() {
                    existing.name = spec.name;
                }
            }
            None => merged.push(spec),
        }
    }
    merged
}
