//! Update operator nodes
//!
//! Each node carries one operator kind and an ordered field-path → operand
//! mapping, rendering to the native `{$op: {path: operand}}` document shape.
//! Operand validation happens at render time; a node with no fields renders
//! an empty document.

use bson::{Bson, Document};

use super::errors::{bson_type_name, is_integer, is_numeric, RenderResult, ValidationError};

/// Update operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// Set a field value
    Set,
    /// Remove a field
    Unset,
    /// Add to a numeric field
    Inc,
    /// Set a field to the server's current date
    CurrentDate,
    /// Append to an array
    Push,
    /// Remove matching array elements
    Pull,
    /// Remove all listed values from an array
    PullAll,
    /// Append to an array unless already present
    AddToSet,
    /// Remove the first or last array element
    Pop,
    /// Rename a field
    Rename,
    /// Keep the smaller of the current and given value
    Min,
    /// Keep the larger of the current and given value
    Max,
    /// Multiply a numeric field
    Mul,
    /// Set only when the update inserts a new document
    SetOnInsert,
    /// Bitwise and/or/xor update
    Bit,
    /// Set the array element matched by the query, via the positional `$`
    SetMatchedElement,
}

impl UpdateKind {
    /// Returns the native operator keyword this kind renders under
    pub fn keyword(&self) -> &'static str {
        match self {
            UpdateKind::Set | UpdateKind::SetMatchedElement => "$set",
            UpdateKind::Unset => "$unset",
            UpdateKind::Inc => "$inc",
            UpdateKind::CurrentDate => "$currentDate",
            UpdateKind::Push => "$push",
            UpdateKind::Pull => "$pull",
            UpdateKind::PullAll => "$pullAll",
            UpdateKind::AddToSet => "$addToSet",
            UpdateKind::Pop => "$pop",
            UpdateKind::Rename => "$rename",
            UpdateKind::Min => "$min",
            UpdateKind::Max => "$max",
            UpdateKind::Mul => "$mul",
            UpdateKind::SetOnInsert => "$setOnInsert",
            UpdateKind::Bit => "$bit",
        }
    }
}

/// One update operator invocation: a kind plus ordered path → operand pairs
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOp {
    kind: UpdateKind,
    fields: Vec<(String, Bson)>,
}

impl UpdateOp {
    /// Creates an operator node from explicit parts
    pub fn new(
        kind: UpdateKind,
        fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>,
    ) -> Self {
        Self {
            kind,
            fields: fields
                .into_iter()
                .map(|(path, value)| (path.into(), value.into()))
                .collect(),
        }
    }

    /// `$set` operator
    pub fn set(fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        Self::new(UpdateKind::Set, fields)
    }

    /// `$unset` operator; takes the paths to remove
    pub fn unset(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(
            UpdateKind::Unset,
            paths.into_iter().map(|p| (p, Bson::String(String::new()))),
        )
    }

    /// `$inc` operator
    pub fn inc(fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        Self::new(UpdateKind::Inc, fields)
    }

    /// `$currentDate` operator; stamps the paths with the server date
    pub fn current_date(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(
            UpdateKind::CurrentDate,
            paths.into_iter().map(|p| (p, Bson::Boolean(true))),
        )
    }

    /// `$push` operator
    pub fn push(fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        Self::new(UpdateKind::Push, fields)
    }

    /// `$pull` operator
    pub fn pull(fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        Self::new(UpdateKind::Pull, fields)
    }

    /// `$pullAll` operator
    pub fn pull_all(fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        Self::new(UpdateKind::PullAll, fields)
    }

    /// `$addToSet` operator
    pub fn add_to_set(
        fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>,
    ) -> Self {
        Self::new(UpdateKind::AddToSet, fields)
    }

    /// `$pop` operator; operand must be 1 (last) or -1 (first)
    pub fn pop(fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        Self::new(UpdateKind::Pop, fields)
    }

    /// `$rename` operator; operand is the new field name
    pub fn rename(fields: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self::new(
            UpdateKind::Rename,
            fields
                .into_iter()
                .map(|(path, target)| (path, Bson::String(target.into()))),
        )
    }

    /// `$min` operator
    pub fn min(fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        Self::new(UpdateKind::Min, fields)
    }

    /// `$max` operator
    pub fn max(fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        Self::new(UpdateKind::Max, fields)
    }

    /// `$mul` operator
    pub fn mul(fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        Self::new(UpdateKind::Mul, fields)
    }

    /// `$setOnInsert` operator
    pub fn set_on_insert(
        fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>,
    ) -> Self {
        Self::new(UpdateKind::SetOnInsert, fields)
    }

    /// `$bit` operator; operand maps and/or/xor to integer values
    pub fn bit(fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>) -> Self {
        Self::new(UpdateKind::Bit, fields)
    }

    /// Sets the array element matched by the query filter.
    ///
    /// Renders under `$set` with the positional `$` segment appended to
    /// each path.
    pub fn set_matched_element(
        fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Bson>)>,
    ) -> Self {
        Self::new(UpdateKind::SetMatchedElement, fields)
    }

    /// Returns the operator kind
    pub fn kind(&self) -> UpdateKind {
        self.kind
    }

    /// Returns the ordered path → operand pairs as constructed
    pub fn fields(&self) -> &[(String, Bson)] {
        &self.fields
    }

    /// Returns true when the node carries no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders the wire-level path for one field, applying the positional
    /// segment for matched-element sets
    pub fn rendered_path(&self, path: &str) -> String {
        match self.kind {
            UpdateKind::SetMatchedElement => format!("{path}.$"),
            _ => path.to_string(),
        }
    }

    fn validate_operand(&self, path: &str, value: &Bson) -> RenderResult<()> {
        match self.kind {
            UpdateKind::Inc | UpdateKind::Mul => {
                if !is_numeric(value) {
                    return Err(ValidationError::NonNumericOperand {
                        operator: self.kind.keyword(),
                        path: path.to_string(),
                        got: bson_type_name(value),
                    });
                }
            }
            UpdateKind::Pop => {
                let valid = matches!(value, Bson::Int32(1 | -1) | Bson::Int64(1 | -1));
                if !valid {
                    return Err(ValidationError::InvalidPopOperand {
                        path: path.to_string(),
                    });
                }
            }
            UpdateKind::PullAll => {
                if !matches!(value, Bson::Array(_)) {
                    return Err(ValidationError::InvalidPullAllOperand {
                        path: path.to_string(),
                        got: bson_type_name(value),
                    });
                }
            }
            UpdateKind::Rename => {
                let valid = matches!(value, Bson::String(target) if !target.is_empty());
                if !valid {
                    return Err(ValidationError::InvalidRenameTarget {
                        path: path.to_string(),
                    });
                }
            }
            UpdateKind::CurrentDate => {
                let valid = match value {
                    Bson::Boolean(true) => true,
                    Bson::Document(spec) => matches!(
                        spec.get_str("$type"),
                        Ok("date" | "timestamp") if spec.len() == 1
                    ),
                    _ => false,
                };
                if !valid {
                    return Err(ValidationError::InvalidCurrentDateOperand {
                        path: path.to_string(),
                    });
                }
            }
            UpdateKind::Bit => {
                let valid = matches!(
                    value,
                    Bson::Document(spec) if !spec.is_empty()
                        && spec.iter().all(|(op, operand)| {
                            matches!(op.as_str(), "and" | "or" | "xor") && is_integer(operand)
                        })
                );
                if !valid {
                    return Err(ValidationError::InvalidBitOperand {
                        path: path.to_string(),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Renders the node to a native update document.
    ///
    /// A node with no fields renders an empty document. The last operand
    /// wins when the same path appears twice within one node.
    pub fn render(&self) -> RenderResult<Document> {
        let mut out = Document::new();
        if self.fields.is_empty() {
            return Ok(out);
        }
        let mut body = Document::new();
        for (path, value) in &self.fields {
            self.validate_operand(path, value)?;
            body.insert(self.rendered_path(path), value.clone());
        }
        out.insert(self.kind.keyword(), body);
        Ok(out)
    }
}
