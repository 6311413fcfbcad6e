//! Model descriptors
//!
//! Immutable per-type schema description: collection name, reference
//! fields, declared indexes, revision flag. Built once at registration
//! time by the schema layer; the core holds read-only references.

use bson::Document;

use crate::index::IndexSpec;

use super::errors::ModelError;

/// Hidden field holding the optimistic-concurrency revision token
pub const REVISION_FIELD: &str = "revision_id";

/// How a reference field physically holds its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A raw pointer to the referenced document's id
    Reference,
    /// A link that query-time reads may resolve eagerly into an embedded
    /// copy of the referenced document
    Fetchable,
}

/// Immutable description of one document model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    collection: String,
    fields: Vec<String>,
    links: Vec<(String, LinkKind)>,
    indexes: Vec<IndexSpec>,
    uses_revision: bool,
}

impl ModelDescriptor {
    /// Starts building a descriptor for a collection
    pub fn builder(collection: impl Into<String>) -> ModelDescriptorBuilder {
        ModelDescriptorBuilder {
            collection: collection.into(),
            fields: Vec::new(),
            links: Vec::new(),
            indexes: Vec::new(),
            uses_revision: false,
        }
    }

    /// Collection this model maps to
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Declared plain field names, in declaration order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Declared reference fields with their kinds, in declaration order
    pub fn links(&self) -> &[(String, LinkKind)] {
        &self.links
    }

    /// Returns the kind of a declared reference field
    pub fn link_kind(&self, name: &str) -> Option<LinkKind> {
        self.links
            .iter()
            .find(|(link, _)| link == name)
            .map(|(_, kind)| *kind)
    }

    /// Returns true when the name is a declared reference field
    pub fn is_link_field(&self, name: &str) -> bool {
        self.links.iter().any(|(link, _)| link == name)
    }

    /// Declared index specs
    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// Whether updates stamp a revision token
    pub fn uses_revision(&self) -> bool {
        self.uses_revision
    }

    /// Renders the inclusion projection for typed reads: `_id`, every
    /// declared field and link, and the revision field when enabled
    pub fn projection(&self) -> Document {
        let mut out = Document::new();
        out.insert("_id", 1);
        for field in &self.fields {
            out.insert(field.clone(), 1);
        }
        for (link, _) in &self.links {
            out.insert(link.clone(), 1);
        }
        if self.uses_revision {
            out.insert(REVISION_FIELD, 1);
        }
        out
    }
}

/// Builder for `ModelDescriptor`
#[derive(Debug, Clone)]
pub struct ModelDescriptorBuilder {
    collection: String,
    fields: Vec<String>,
    links: Vec<(String, LinkKind)>,
    indexes: Vec<IndexSpec>,
    uses_revision: bool,
}

impl ModelDescriptorBuilder {
    /// Declares a plain field
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// Declares several plain fields
    pub fn fields(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declares a reference field
    pub fn link_field(mut self, name: impl Into<String>, kind: LinkKind) -> Self {
        self.links.push((name.into(), kind));
        self
    }

    /// Declares an index
    pub fn index(mut self, spec: IndexSpec) -> Self {
        self.indexes.push(spec);
        self
    }

    /// Enables revision stamping on updates
    pub fn with_revision(mut self) -> Self {
        self.uses_revision = true;
        self
    }

    /// Validates and builds the descriptor
    pub fn build(self) -> Result<ModelDescriptor, ModelError> {
        if self.collection.is_empty() {
            return Err(ModelError::EmptyCollectionName);
        }

        let mut seen = Vec::new();
        for name in self
            .fields
            .iter()
            .chain(self.links.iter().map(|(name, _)| name))
        {
            if name.is_empty() || name.contains('.') {
                return Err(ModelError::InvalidFieldName { name: name.clone() });
            }
            if seen.contains(&name) {
                return Err(ModelError::DuplicateField { name: name.clone() });
            }
            seen.push(name);
        }

        Ok(ModelDescriptor {
            collection: self.collection,
            fields: self.fields,
            links: self.links,
            indexes: self.indexes,
            uses_revision: self.uses_revision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn sample() -> ModelDescriptor {
        ModelDescriptor::builder("posts")
            .fields(["title", "body"])
            .link_field("author", LinkKind::Fetchable)
            .with_revision()
            .build()
            .unwrap()
    }

    #[test]
    fn test_link_lookup() {
        let model = sample();
        assert!(model.is_link_field("author"));
        assert_eq!(model.link_kind("author"), Some(LinkKind::Fetchable));
        assert!(!model.is_link_field("title"));
        assert_eq!(model.link_kind("title"), None);
    }

    #[test]
    fn test_projection_shape() {
        let model = sample();
        assert_eq!(
            model.projection(),
            doc! {"_id": 1, "title": 1, "body": 1, "author": 1, "revision_id": 1}
        );
    }

    #[test]
    fn test_projection_without_revision() {
        let model = ModelDescriptor::builder("posts")
            .field("title")
            .build()
            .unwrap();
        assert_eq!(model.projection(), doc! {"_id": 1, "title": 1});
    }

    #[test]
    fn test_rejects_dotted_field_name() {
        let err = ModelDescriptor::builder("posts")
            .field("a.b")
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::InvalidFieldName { name: "a.b".into() });
    }

    #[test]
    fn test_rejects_duplicate_across_fields_and_links() {
        let err = ModelDescriptor::builder("posts")
            .field("author")
            .link_field("author", LinkKind::Reference)
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicateField { name: "author".into() });
    }

    #[test]
    fn test_rejects_empty_collection() {
        let err = ModelDescriptor::builder("").build().unwrap_err();
        assert_eq!(err, ModelError::EmptyCollectionName);
    }
}
