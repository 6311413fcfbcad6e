//! Update composition
//!
//! Merges one or more update-operator invocations into a single composite
//! update document. Operators of the same kind merge last-write-wins per
//! path; operators of different kinds on the same path are a conflict.
//! Revision-stamped models get a final `$set` of the revision token,
//! applied after all user operators.

use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Document};

use crate::model::{ModelDescriptor, REVISION_FIELD};
use crate::operators::UpdateOp;

use super::errors::{ComposeError, ConflictingUpdateError};

/// Builds composite update documents from operator invocations
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateComposer {
    stamp_revision: bool,
}

impl UpdateComposer {
    /// Composer without revision stamping
    pub fn new() -> Self {
        Self::default()
    }

    /// Composer honoring the model's revision flag
    pub fn for_model(model: &ModelDescriptor) -> Self {
        Self {
            stamp_revision: model.uses_revision(),
        }
    }

    /// Merges operator invocations into one update document.
    ///
    /// Inputs are consumed in order; within one call the last operand for
    /// a (kind, path) pair wins. Fails fast on a cross-kind path conflict
    /// or a malformed operand, before any I/O can happen.
    pub fn compose(
        &self,
        ops: impl IntoIterator<Item = UpdateOp>,
    ) -> Result<Document, ComposeError> {
        let mut out = Document::new();
        for op in ops {
            merge_rendered(&mut out, op.render()?)?;
        }

        if self.stamp_revision {
            let mut stamp = Document::new();
            stamp.insert(REVISION_FIELD, new_revision_token());
            let mut rendered = Document::new();
            rendered.insert("$set", stamp);
            merge_rendered(&mut out, rendered)?;
        }

        Ok(out)
    }
}

/// Generates a fresh revision token as a UUID v4 binary value
fn new_revision_token() -> Bson {
    Bson::Binary(Binary {
        subtype: BinarySubtype::Uuid,
        bytes: uuid::Uuid::new_v4().as_bytes().to_vec(),
    })
}

/// Folds one rendered operator into the composite document, rejecting
/// cross-kind collisions on the same path
fn merge_rendered(out: &mut Document, rendered: Document) -> Result<(), ConflictingUpdateError> {
    for (keyword, body) in rendered {
        let Bson::Document(body) = body else {
            continue;
        };
        for (path, value) in body {
            for (existing_keyword, existing_body) in out.iter() {
                if existing_keyword == &keyword {
                    continue;
                }
                let holds_path = matches!(
                    existing_body,
                    Bson::Document(d) if d.contains_key(&path)
                );
                if holds_path {
                    return Err(ConflictingUpdateError {
                        path,
                        first: existing_keyword.clone(),
                        second: keyword,
                    });
                }
            }
            match out.get_document_mut(&keyword) {
                Ok(dest) => {
                    dest.insert(path, value);
                }
                Err(_) => {
                    let mut dest = Document::new();
                    dest.insert(path, value);
                    out.insert(keyword.clone(), dest);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_disjoint_operators_merge() {
        let update = UpdateComposer::new()
            .compose([UpdateOp::set([("x", 1)]), UpdateOp::inc([("y", 2)])])
            .unwrap();
        assert_eq!(update, doc! {"$set": {"x": 1}, "$inc": {"y": 2}});
    }

    #[test]
    fn test_same_kind_same_path_last_write_wins() {
        let update = UpdateComposer::new()
            .compose([UpdateOp::set([("x", 1)]), UpdateOp::set([("x", 2)])])
            .unwrap();
        assert_eq!(update, doc! {"$set": {"x": 2}});
    }

    #[test]
    fn test_cross_kind_same_path_conflicts() {
        let err = UpdateComposer::new()
            .compose([UpdateOp::set([("x", 1)]), UpdateOp::inc([("x", 2)])])
            .unwrap_err();

        assert_eq!(
            err,
            ComposeError::Conflict(ConflictingUpdateError {
                path: "x".into(),
                first: "$set".into(),
                second: "$inc".into(),
            })
        );
    }

    #[test]
    fn test_validation_fails_composition() {
        let err = UpdateComposer::new()
            .compose([UpdateOp::inc([("x", "one")])])
            .unwrap_err();
        assert!(matches!(err, ComposeError::Validation(_)));
    }

    #[test]
    fn test_empty_operator_contributes_nothing() {
        let update = UpdateComposer::new()
            .compose([UpdateOp::set([("x", 1)]), UpdateOp::inc(Vec::<(String, i32)>::new())])
            .unwrap();
        assert_eq!(update, doc! {"$set": {"x": 1}});
    }

    #[test]
    fn test_matched_element_set_composes_with_plain_set() {
        let update = UpdateComposer::new()
            .compose([
                UpdateOp::set([("status", "graded")]),
                UpdateOp::set_matched_element([("grades", 95)]),
            ])
            .unwrap();
        assert_eq!(update, doc! {"$set": {"status": "graded", "grades.$": 95}});
    }

    fn revision_model() -> ModelDescriptor {
        ModelDescriptor::builder("posts")
            .field("title")
            .with_revision()
            .build()
            .unwrap()
    }

    #[test]
    fn test_revision_stamp_is_appended() {
        let model = revision_model();
        let update = UpdateComposer::for_model(&model)
            .compose([UpdateOp::set([("title", "hello")])])
            .unwrap();

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("title").unwrap(), "hello");
        assert!(matches!(
            set.get(REVISION_FIELD),
            Some(Bson::Binary(Binary { subtype: BinarySubtype::Uuid, .. }))
        ));
        // The stamp comes after user fields.
        assert_eq!(
            set.iter().last().map(|(key, _)| key.as_str()),
            Some(REVISION_FIELD)
        );
    }

    #[test]
    fn test_revision_stamp_overrides_user_set() {
        let model = revision_model();
        let update = UpdateComposer::for_model(&model)
            .compose([UpdateOp::set([(REVISION_FIELD, "forged")])])
            .unwrap();

        let set = update.get_document("$set").unwrap();
        assert!(set.get_str(REVISION_FIELD).is_err(), "token must replace the forged string");
    }

    #[test]
    fn test_revision_tokens_are_unique_per_composition() {
        let model = revision_model();
        let composer = UpdateComposer::for_model(&model);

        let first = composer.compose([UpdateOp::set([("title", "a")])]).unwrap();
        let second = composer.compose([UpdateOp::set([("title", "b")])]).unwrap();

        let token = |update: &Document| {
            update
                .get_document("$set")
                .unwrap()
                .get(REVISION_FIELD)
                .cloned()
                .unwrap()
        };
        assert_ne!(token(&first), token(&second));
    }

    #[test]
    fn test_no_stamp_without_revision_flag() {
        let model = ModelDescriptor::builder("posts")
            .field("title")
            .build()
            .unwrap();
        let update = UpdateComposer::for_model(&model)
            .compose([UpdateOp::set([("title", "hello")])])
            .unwrap();
        assert!(update.get_document("$set").unwrap().get(REVISION_FIELD).is_none());
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let op = UpdateOp::set([("x", 1)]);
        let composer = UpdateComposer::new();
        let _ = composer.compose([op.clone()]).unwrap();
        assert_eq!(op, UpdateOp::set([("x", 1)]));
    }
}
