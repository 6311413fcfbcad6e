//! Query expression tree
//!
//! Typed comparison and logical operator nodes that render to native BSON
//! filter documents. Expressions are immutable value objects: combinators
//! build new trees and rendering never mutates or performs I/O.

use bson::{Bson, Document};

use super::errors::{bson_type_name, is_integer, RenderResult, ValidationError};

/// A single comparison operator applied to one field path
#[derive(Debug, Clone, PartialEq)]
pub enum CompareOp {
    /// Equality: `{path: {$eq: value}}`
    Eq(Bson),
    /// Inequality: `{path: {$ne: value}}`
    Ne(Bson),
    /// Greater than
    Gt(Bson),
    /// Greater than or equal
    Gte(Bson),
    /// Less than
    Lt(Bson),
    /// Less than or equal
    Lte(Bson),
    /// Membership: `{path: {$in: [..]}}`
    In(Vec<Bson>),
    /// Non-membership: `{path: {$nin: [..]}}`
    NotIn(Vec<Bson>),
    /// Array contains all: `{path: {$all: [..]}}`
    All(Vec<Bson>),
    /// Array element matches a sub-filter
    ElemMatch(Box<Expression>),
    /// Array length equality
    Size(i64),
    /// Field presence check
    Exists(bool),
    /// BSON type check; accepts a type alias string or numeric code
    Type(Bson),
    /// Regular expression match with optional flags
    Regex {
        pattern: String,
        options: Option<String>,
    },
    /// Modulo: `{path: {$mod: [divisor, remainder]}}`
    Mod { divisor: i64, remainder: i64 },
    /// Geometry containment
    GeoWithin(Document),
    /// Geometry intersection
    GeoIntersects(Document),
    /// Proximity search on a 2dsphere index
    Near {
        geometry: Document,
        max_distance: Option<f64>,
        min_distance: Option<f64>,
    },
    /// Spherical proximity search
    NearSphere {
        geometry: Document,
        max_distance: Option<f64>,
        min_distance: Option<f64>,
    },
    /// All mask bits clear
    BitsAllClear(Bson),
    /// All mask bits set
    BitsAllSet(Bson),
    /// Any mask bit clear
    BitsAnyClear(Bson),
    /// Any mask bit set
    BitsAnySet(Bson),
}

impl CompareOp {
    /// Returns the operator keyword for error messages and conflict reports
    pub fn keyword(&self) -> &'static str {
        match self {
            CompareOp::Eq(_) => "$eq",
            CompareOp::Ne(_) => "$ne",
            CompareOp::Gt(_) => "$gt",
            CompareOp::Gte(_) => "$gte",
            CompareOp::Lt(_) => "$lt",
            CompareOp::Lte(_) => "$lte",
            CompareOp::In(_) => "$in",
            CompareOp::NotIn(_) => "$nin",
            CompareOp::All(_) => "$all",
            CompareOp::ElemMatch(_) => "$elemMatch",
            CompareOp::Size(_) => "$size",
            CompareOp::Exists(_) => "$exists",
            CompareOp::Type(_) => "$type",
            CompareOp::Regex { .. } => "$regex",
            CompareOp::Mod { .. } => "$mod",
            CompareOp::GeoWithin(_) => "$geoWithin",
            CompareOp::GeoIntersects(_) => "$geoIntersects",
            CompareOp::Near { .. } => "$near",
            CompareOp::NearSphere { .. } => "$nearSphere",
            CompareOp::BitsAllClear(_) => "$bitsAllClear",
            CompareOp::BitsAllSet(_) => "$bitsAllSet",
            CompareOp::BitsAnyClear(_) => "$bitsAnyClear",
            CompareOp::BitsAnySet(_) => "$bitsAnySet",
        }
    }

    /// Renders the operator document placed under the field path
    fn operator_document(&self, path: &str) -> RenderResult<Document> {
        let mut out = Document::new();
        match self {
            CompareOp::Eq(v)
            | CompareOp::Ne(v)
            | CompareOp::Gt(v)
            | CompareOp::Gte(v)
            | CompareOp::Lt(v)
            | CompareOp::Lte(v) => {
                out.insert(self.keyword(), v.clone());
            }
            CompareOp::In(vs) | CompareOp::NotIn(vs) | CompareOp::All(vs) => {
                out.insert(self.keyword(), Bson::Array(vs.clone()));
            }
            CompareOp::ElemMatch(sub) => {
                out.insert("$elemMatch", sub.render()?);
            }
            CompareOp::Size(n) => {
                out.insert("$size", *n);
            }
            CompareOp::Exists(present) => {
                out.insert("$exists", *present);
            }
            CompareOp::Type(t) => {
                out.insert("$type", t.clone());
            }
            CompareOp::Regex { pattern, options } => {
                out.insert("$regex", pattern.clone());
                if let Some(opts) = options {
                    out.insert("$options", opts.clone());
                }
            }
            CompareOp::Mod { divisor, remainder } => {
                out.insert("$mod", Bson::Array(vec![Bson::Int64(*divisor), Bson::Int64(*remainder)]));
            }
            CompareOp::GeoWithin(geometry) => {
                out.insert("$geoWithin", geometry.clone());
            }
            CompareOp::GeoIntersects(geometry) => {
                out.insert("$geoIntersects", geometry.clone());
            }
            CompareOp::Near {
                geometry,
                max_distance,
                min_distance,
            }
            | CompareOp::NearSphere {
                geometry,
                max_distance,
                min_distance,
            } => {
                let mut near = Document::new();
                near.insert("$geometry", geometry.clone());
                if let Some(max) = max_distance {
                    near.insert("$maxDistance", *max);
                }
                if let Some(min) = min_distance {
                    near.insert("$minDistance", *min);
                }
                out.insert(self.keyword(), near);
            }
            CompareOp::BitsAllClear(mask)
            | CompareOp::BitsAllSet(mask)
            | CompareOp::BitsAnyClear(mask)
            | CompareOp::BitsAnySet(mask) => {
                let valid = is_integer(mask)
                    || matches!(mask, Bson::Array(positions) if positions.iter().all(is_integer));
                if !valid {
                    return Err(ValidationError::InvalidBitmask {
                        operator: self.keyword(),
                        path: path.to_string(),
                        got: bson_type_name(mask),
                    });
                }
                out.insert(self.keyword(), mask.clone());
            }
        }
        Ok(out)
    }
}

/// A comparison node: one field path plus one operator
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Field path, `.`-separated for nested documents
    pub path: String,
    /// The operator applied at the path
    pub op: CompareOp,
}

/// Full-text search clause; not bound to a field path
#[derive(Debug, Clone, PartialEq)]
pub struct TextSearch {
    /// Search string
    pub search: String,
    /// Optional language override
    pub language: Option<String>,
    /// Case-sensitive matching
    pub case_sensitive: Option<bool>,
    /// Diacritic-sensitive matching
    pub diacritic_sensitive: Option<bool>,
}

impl TextSearch {
    /// Creates a text search clause with default options
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            language: None,
            case_sensitive: None,
            diacritic_sensitive: None,
        }
    }

    /// Sets the search language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Enables case-sensitive matching
    pub fn case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = Some(value);
        self
    }

    /// Enables diacritic-sensitive matching
    pub fn diacritic_sensitive(mut self, value: bool) -> Self {
        self.diacritic_sensitive = Some(value);
        self
    }
}

/// An immutable query expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A single field comparison
    Compare(Comparison),
    /// All sub-expressions must match
    And(Vec<Expression>),
    /// At least one sub-expression must match
    Or(Vec<Expression>),
    /// No sub-expression may match
    Nor(Vec<Expression>),
    /// Negates a single field comparison
    Not(Box<Expression>),
    /// Full-text search clause
    Text(TextSearch),
    /// Database-specific filter passed through opaquely
    Raw(Document),
}

impl Expression {
    /// Equality comparison
    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::compare(path, CompareOp::Eq(value.into()))
    }

    /// Inequality comparison
    pub fn ne(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::compare(path, CompareOp::Ne(value.into()))
    }

    /// Greater-than comparison
    pub fn gt(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::compare(path, CompareOp::Gt(value.into()))
    }

    /// Greater-than-or-equal comparison
    pub fn gte(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::compare(path, CompareOp::Gte(value.into()))
    }

    /// Less-than comparison
    pub fn lt(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::compare(path, CompareOp::Lt(value.into()))
    }

    /// Less-than-or-equal comparison
    pub fn lte(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::compare(path, CompareOp::Lte(value.into()))
    }

    /// Membership test against a value set
    pub fn is_in(path: impl Into<String>, values: impl IntoIterator<Item = impl Into<Bson>>) -> Self {
        Self::compare(path, CompareOp::In(values.into_iter().map(Into::into).collect()))
    }

    /// Non-membership test against a value set
    pub fn not_in(path: impl Into<String>, values: impl IntoIterator<Item = impl Into<Bson>>) -> Self {
        Self::compare(path, CompareOp::NotIn(values.into_iter().map(Into::into).collect()))
    }

    /// Array-contains-all test
    pub fn all(path: impl Into<String>, values: impl IntoIterator<Item = impl Into<Bson>>) -> Self {
        Self::compare(path, CompareOp::All(values.into_iter().map(Into::into).collect()))
    }

    /// Array element match against a sub-filter
    pub fn elem_match(path: impl Into<String>, sub: Expression) -> Self {
        Self::compare(path, CompareOp::ElemMatch(Box::new(sub)))
    }

    /// Array length equality
    pub fn size(path: impl Into<String>, len: i64) -> Self {
        Self::compare(path, CompareOp::Size(len))
    }

    /// Field existence check
    pub fn exists(path: impl Into<String>, present: bool) -> Self {
        Self::compare(path, CompareOp::Exists(present))
    }

    /// BSON type check
    pub fn has_type(path: impl Into<String>, type_spec: impl Into<Bson>) -> Self {
        Self::compare(path, CompareOp::Type(type_spec.into()))
    }

    /// Regular expression match
    pub fn regex(path: impl Into<String>, pattern: impl Into<String>, options: Option<&str>) -> Self {
        Self::compare(
            path,
            CompareOp::Regex {
                pattern: pattern.into(),
                options: options.map(str::to_string),
            },
        )
    }

    /// Modulo test
    pub fn modulo(path: impl Into<String>, divisor: i64, remainder: i64) -> Self {
        Self::compare(path, CompareOp::Mod { divisor, remainder })
    }

    /// Geometry containment test
    pub fn geo_within(path: impl Into<String>, geometry: Document) -> Self {
        Self::compare(path, CompareOp::GeoWithin(geometry))
    }

    /// Geometry intersection test
    pub fn geo_intersects(path: impl Into<String>, geometry: Document) -> Self {
        Self::compare(path, CompareOp::GeoIntersects(geometry))
    }

    /// Proximity search
    pub fn near(
        path: impl Into<String>,
        geometry: Document,
        max_distance: Option<f64>,
        min_distance: Option<f64>,
    ) -> Self {
        Self::compare(
            path,
            CompareOp::Near {
                geometry,
                max_distance,
                min_distance,
            },
        )
    }

    /// Spherical proximity search
    pub fn near_sphere(
        path: impl Into<String>,
        geometry: Document,
        max_distance: Option<f64>,
        min_distance: Option<f64>,
    ) -> Self {
        Self::compare(
            path,
            CompareOp::NearSphere {
                geometry,
                max_distance,
                min_distance,
            },
        )
    }

    /// All mask bits clear
    pub fn bits_all_clear(path: impl Into<String>, mask: impl Into<Bson>) -> Self {
        Self::compare(path, CompareOp::BitsAllClear(mask.into()))
    }

    /// All mask bits set
    pub fn bits_all_set(path: impl Into<String>, mask: impl Into<Bson>) -> Self {
        Self::compare(path, CompareOp::BitsAllSet(mask.into()))
    }

    /// Any mask bit clear
    pub fn bits_any_clear(path: impl Into<String>, mask: impl Into<Bson>) -> Self {
        Self::compare(path, CompareOp::BitsAnyClear(mask.into()))
    }

    /// Any mask bit set
    pub fn bits_any_set(path: impl Into<String>, mask: impl Into<Bson>) -> Self {
        Self::compare(path, CompareOp::BitsAnySet(mask.into()))
    }

    /// Conjunction of sub-expressions
    pub fn and(sub: impl IntoIterator<Item = Expression>) -> Self {
        Expression::And(sub.into_iter().collect())
    }

    /// Disjunction of sub-expressions
    pub fn or(sub: impl IntoIterator<Item = Expression>) -> Self {
        Expression::Or(sub.into_iter().collect())
    }

    /// Joint denial of sub-expressions
    pub fn nor(sub: impl IntoIterator<Item = Expression>) -> Self {
        Expression::Nor(sub.into_iter().collect())
    }

    /// Negation of a single field comparison
    pub fn not(sub: Expression) -> Self {
        Expression::Not(Box::new(sub))
    }

    /// Full-text search with default options
    pub fn text(search: impl Into<String>) -> Self {
        Expression::Text(TextSearch::new(search))
    }

    /// Opaque database-specific filter
    pub fn raw(filter: Document) -> Self {
        Expression::Raw(filter)
    }

    fn compare(path: impl Into<String>, op: CompareOp) -> Self {
        Expression::Compare(Comparison {
            path: path.into(),
            op,
        })
    }

    /// Renders the expression to a native filter document.
    ///
    /// Rendering is pure and deterministic. Logical combinators with an
    /// empty operand set render an empty document rather than failing.
    pub fn render(&self) -> RenderResult<Document> {
        let mut out = Document::new();
        match self {
            Expression::Compare(cmp) => {
                out.insert(cmp.path.clone(), cmp.op.operator_document(&cmp.path)?);
            }
            Expression::And(sub) | Expression::Or(sub) | Expression::Nor(sub) => {
                if sub.is_empty() {
                    return Ok(out);
                }
                let keyword = match self {
                    Expression::And(_) => "$and",
                    Expression::Or(_) => "$or",
                    _ => "$nor",
                };
                let rendered = sub
                    .iter()
                    .map(|e| e.render().map(Bson::Document))
                    .collect::<RenderResult<Vec<_>>>()?;
                out.insert(keyword, Bson::Array(rendered));
            }
            Expression::Not(inner) => match inner.as_ref() {
                Expression::Compare(cmp) => {
                    let mut negated = Document::new();
                    negated.insert("$not", cmp.op.operator_document(&cmp.path)?);
                    out.insert(cmp.path.clone(), negated);
                }
                _ => return Err(ValidationError::NotRequiresComparison),
            },
            Expression::Text(text) => {
                let mut clause = Document::new();
                clause.insert("$search", text.search.clone());
                if let Some(language) = &text.language {
                    clause.insert("$language", language.clone());
                }
                if let Some(case) = text.case_sensitive {
                    clause.insert("$caseSensitive", case);
                }
                if let Some(diacritic) = text.diacritic_sensitive {
                    clause.insert("$diacriticSensitive", diacritic);
                }
                out.insert("$text", clause);
            }
            Expression::Raw(filter) => {
                out = filter.clone();
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_comparison_render() {
        let expr = Expression::eq("name", "Alice");
        assert_eq!(expr.render().unwrap(), doc! {"name": {"$eq": "Alice"}});

        let expr = Expression::gte("age", 18);
        assert_eq!(expr.render().unwrap(), doc! {"age": {"$gte": 18}});
    }

    #[test]
    fn test_membership_render() {
        let expr = Expression::is_in("status", ["active", "pending"]);
        assert_eq!(
            expr.render().unwrap(),
            doc! {"status": {"$in": ["active", "pending"]}}
        );

        let expr = Expression::not_in("status", ["deleted"]);
        assert_eq!(expr.render().unwrap(), doc! {"status": {"$nin": ["deleted"]}});
    }

    #[test]
    fn test_logical_render() {
        let expr = Expression::and([Expression::eq("a", 1), Expression::gt("b", 2)]);
        assert_eq!(
            expr.render().unwrap(),
            doc! {"$and": [{"a": {"$eq": 1}}, {"b": {"$gt": 2}}]}
        );
    }

    #[test]
    fn test_empty_logical_is_noop() {
        assert_eq!(Expression::and([]).render().unwrap(), doc! {});
        assert_eq!(Expression::or([]).render().unwrap(), doc! {});
        assert_eq!(Expression::nor([]).render().unwrap(), doc! {});
    }

    #[test]
    fn test_not_wraps_comparison() {
        let expr = Expression::not(Expression::gt("age", 30));
        assert_eq!(
            expr.render().unwrap(),
            doc! {"age": {"$not": {"$gt": 30}}}
        );
    }

    #[test]
    fn test_not_rejects_logical_operand() {
        let expr = Expression::not(Expression::and([Expression::eq("a", 1)]));
        assert_eq!(
            expr.render().unwrap_err(),
            ValidationError::NotRequiresComparison
        );
    }

    #[test]
    fn test_elem_match_render() {
        let expr = Expression::elem_match(
            "scores",
            Expression::and([Expression::gte("value", 80), Expression::lt("value", 90)]),
        );
        assert_eq!(
            expr.render().unwrap(),
            doc! {"scores": {"$elemMatch": {"$and": [{"value": {"$gte": 80}}, {"value": {"$lt": 90}}]}}}
        );
    }

    #[test]
    fn test_regex_render() {
        let expr = Expression::regex("name", "^Al", Some("i"));
        assert_eq!(
            expr.render().unwrap(),
            doc! {"name": {"$regex": "^Al", "$options": "i"}}
        );
    }

    #[test]
    fn test_text_render() {
        let expr = Expression::Text(
            TextSearch::new("coffee").with_language("en").case_sensitive(true),
        );
        assert_eq!(
            expr.render().unwrap(),
            doc! {"$text": {"$search": "coffee", "$language": "en", "$caseSensitive": true}}
        );
    }

    #[test]
    fn test_near_render() {
        let geometry = doc! {"type": "Point", "coordinates": [2.3, 48.8]};
        let expr = Expression::near("location", geometry.clone(), Some(500.0), None);
        assert_eq!(
            expr.render().unwrap(),
            doc! {"location": {"$near": {"$geometry": geometry, "$maxDistance": 500.0}}}
        );
    }

    #[test]
    fn test_bitmask_validation() {
        let expr = Expression::bits_all_set("flags", 6);
        assert_eq!(
            expr.render().unwrap(),
            doc! {"flags": {"$bitsAllSet": 6}}
        );

        let expr = Expression::bits_all_set("flags", "six");
        let err = expr.render().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBitmask { operator: "$bitsAllSet", .. }));
    }

    #[test]
    fn test_raw_passthrough() {
        let filter = doc! {"$where": "this.a > this.b"};
        assert_eq!(Expression::raw(filter.clone()).render().unwrap(), filter);
    }

    #[test]
    fn test_render_does_not_mutate() {
        let expr = Expression::eq("a", 1);
        let first = expr.render().unwrap();
        let second = expr.render().unwrap();
        assert_eq!(first, second);
    }
}
