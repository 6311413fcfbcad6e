//! # Operator Errors
//!
//! Render-time validation errors for query and update operator nodes.
//!
//! Operand checking happens at render time, not at construction: field-level
//! type information lives on the model descriptor, which is not always in
//! scope when an expression is built.

use thiserror::Error;

use bson::Bson;

/// Result type for operator rendering
pub type RenderResult<T> = Result<T, ValidationError>;

/// A malformed operand detected while rendering an operator node
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Numeric-only operator received a non-numeric operand
    #[error("{operator} requires a numeric operand for `{path}`, got {got}")]
    NonNumericOperand {
        /// Operator keyword, e.g. `$inc`
        operator: &'static str,
        /// Target field path
        path: String,
        /// BSON type name of the rejected operand
        got: &'static str,
    },

    /// Bitwise query operator received something other than an integer mask
    /// or an array of integer bit positions
    #[error("{operator} requires an integer mask or array of bit positions for `{path}`, got {got}")]
    InvalidBitmask {
        operator: &'static str,
        path: String,
        got: &'static str,
    },

    /// `$pop` operand was not 1 or -1
    #[error("$pop operand for `{path}` must be 1 or -1")]
    InvalidPopOperand { path: String },

    /// `$pullAll` operand was not an array
    #[error("$pullAll operand for `{path}` must be an array, got {got}")]
    InvalidPullAllOperand { path: String, got: &'static str },

    /// `$rename` target was empty or not a string
    #[error("$rename target for `{path}` must be a non-empty string")]
    InvalidRenameTarget { path: String },

    /// `$currentDate` operand was neither `true` nor a `$type` document
    #[error("$currentDate operand for `{path}` must be true or a {{\"$type\": \"date\"|\"timestamp\"}} document")]
    InvalidCurrentDateOperand { path: String },

    /// `$bit` operand was not a document mapping and/or/xor to integers
    #[error("$bit operand for `{path}` must map and/or/xor to integer values")]
    InvalidBitOperand { path: String },

    /// `$not` wraps something other than a single field comparison
    #[error("$not requires a field comparison operand")]
    NotRequiresComparison,
}

/// Returns the BSON type name for error messages
pub(crate) fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => "javascript",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binary",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal128",
        Bson::Undefined => "undefined",
        Bson::MaxKey => "maxKey",
        Bson::MinKey => "minKey",
        Bson::DbPointer(_) => "dbPointer",
    }
}

/// Returns true for BSON values `$inc`/`$mul` accept
pub(crate) fn is_numeric(value: &Bson) -> bool {
    matches!(
        value,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_)
    )
}

/// Returns true for BSON integer values
pub(crate) fn is_integer(value: &Bson) -> bool {
    matches!(value, Bson::Int32(_) | Bson::Int64(_))
}
