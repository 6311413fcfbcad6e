//! Link-aware query rewriting
//!
//! Rewrites `<refField>.id` comparison paths into the path that addresses
//! the identifier inside the stored reference representation: `_id` of the
//! embedded copy under eager fetching, `$id` of the raw pointer otherwise.
//!
//! Only an exact two-segment path whose first segment is a declared
//! reference field and whose second segment is literally `id` triggers a
//! rewrite. Everything else passes through, so queries over unrelated
//! fields that happen to be named `id` are never corrupted.

use bson::{Bson, Document};

use crate::model::ModelDescriptor;
use crate::operators::{CompareOp, Comparison, Expression};

use super::errors::UnresolvedLinkError;

/// How the caller reads referenced documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// References are resolved eagerly; the field holds an embedded copy
    FetchLinks,
    /// References stay raw pointers
    References,
}

/// Rewrites query expressions for one model under one read mode
pub struct LinkResolver<'a> {
    model: &'a ModelDescriptor,
    mode: ReadMode,
}

impl<'a> LinkResolver<'a> {
    /// Creates a resolver for a model and read mode
    pub fn new(model: &'a ModelDescriptor, mode: ReadMode) -> Self {
        Self { model, mode }
    }

    /// Rewrites reference paths in an expression, returning a new tree.
    /// Unrecognized shapes pass through unchanged.
    pub fn resolve(&self, expr: &Expression) -> Expression {
        match expr {
            Expression::Compare(cmp) => Expression::Compare(Comparison {
                path: self.rewrite_path(&cmp.path).unwrap_or_else(|| cmp.path.clone()),
                op: self.resolve_op(&cmp.op),
            }),
            Expression::And(sub) => Expression::And(self.resolve_all(sub)),
            Expression::Or(sub) => Expression::Or(self.resolve_all(sub)),
            Expression::Nor(sub) => Expression::Nor(self.resolve_all(sub)),
            Expression::Not(inner) => Expression::Not(Box::new(self.resolve(inner))),
            Expression::Text(text) => Expression::Text(text.clone()),
            Expression::Raw(filter) => Expression::Raw(self.resolve_document(filter)),
        }
    }

    /// Like [`resolve`](Self::resolve), but reports reference-rooted `id`
    /// paths deeper than two segments instead of passing them through
    pub fn resolve_strict(&self, expr: &Expression) -> Result<Expression, UnresolvedLinkError> {
        self.check(expr)?;
        Ok(self.resolve(expr))
    }

    fn resolve_all(&self, sub: &[Expression]) -> Vec<Expression> {
        sub.iter().map(|e| self.resolve(e)).collect()
    }

    /// Returns the rewritten path for the one recognized shape
    fn rewrite_path(&self, path: &str) -> Option<String> {
        let mut segments = path.split('.');
        let root = segments.next()?;
        let tail = segments.next()?;
        if segments.next().is_some() || tail != "id" || !self.model.is_link_field(root) {
            return None;
        }
        Some(match self.mode {
            ReadMode::FetchLinks => format!("{root}._id"),
            ReadMode::References => format!("{root}.$id"),
        })
    }

    /// Recurses into operand values that are themselves mapping
    /// expressions, applying the path rule at every nesting level
    fn resolve_op(&self, op: &CompareOp) -> CompareOp {
        match op {
            CompareOp::Eq(v) => CompareOp::Eq(self.resolve_value(v)),
            CompareOp::Ne(v) => CompareOp::Ne(self.resolve_value(v)),
            CompareOp::Gt(v) => CompareOp::Gt(self.resolve_value(v)),
            CompareOp::Gte(v) => CompareOp::Gte(self.resolve_value(v)),
            CompareOp::Lt(v) => CompareOp::Lt(self.resolve_value(v)),
            CompareOp::Lte(v) => CompareOp::Lte(self.resolve_value(v)),
            CompareOp::In(vs) => CompareOp::In(vs.clone()),
            CompareOp::NotIn(vs) => CompareOp::NotIn(vs.clone()),
            CompareOp::All(vs) => CompareOp::All(vs.clone()),
            CompareOp::ElemMatch(sub) => CompareOp::ElemMatch(Box::new(self.resolve(sub))),
            other => other.clone(),
        }
    }

    fn resolve_value(&self, value: &Bson) -> Bson {
        match value {
            Bson::Document(doc) => Bson::Document(self.resolve_document(doc)),
            other => other.clone(),
        }
    }

    fn resolve_document(&self, doc: &Document) -> Document {
        let mut out = Document::new();
        for (key, value) in doc {
            let new_key = self.rewrite_path(key).unwrap_or_else(|| key.clone());
            out.insert(new_key, self.resolve_value(value));
        }
        out
    }

    fn check(&self, expr: &Expression) -> Result<(), UnresolvedLinkError> {
        match expr {
            Expression::Compare(cmp) => {
                self.check_path(&cmp.path)?;
                if let CompareOp::ElemMatch(sub) = &cmp.op {
                    self.check(sub)?;
                }
                Ok(())
            }
            Expression::And(sub) | Expression::Or(sub) | Expression::Nor(sub) => {
                sub.iter().try_for_each(|e| self.check(e))
            }
            Expression::Not(inner) => self.check(inner),
            Expression::Text(_) => Ok(()),
            Expression::Raw(filter) => self.check_document(filter),
        }
    }

    fn check_document(&self, doc: &Document) -> Result<(), UnresolvedLinkError> {
        for (key, value) in doc {
            self.check_path(key)?;
            if let Bson::Document(inner) = value {
                self.check_document(inner)?;
            }
        }
        Ok(())
    }

    fn check_path(&self, path: &str) -> Result<(), UnresolvedLinkError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.len() > 2
            && segments.last() == Some(&"id")
            && self.model.is_link_field(segments[0])
        {
            return Err(UnresolvedLinkError {
                path: path.to_string(),
                field: segments[0].to_string(),
            });
        }
        Ok(())
    }
}
