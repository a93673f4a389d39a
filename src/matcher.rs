//! Record matching
//!
//! A polymorphic containment test over scalar strings and ordered string sets,
//! and a record filter built on top of it. Matching is case-insensitive
//! substring containment:
//!
//! | query  | value  | matches when |
//! |--------|--------|--------------|
//! | scalar | scalar | value contains query |
//! | set    | set    | every query element is contained in some value element |
//! | scalar | set    | some value element contains query |
//! | set    | scalar | value contains some query element |
//!
//! Any other combination falls back to strict equality.

use crate::error::TrendError;
use crate::types::{value_to_text, Record};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Operand of a containment test
#[derive(Debug, Clone, PartialEq)]
pub enum MatchValue {
    Scalar(String),
    Set(Vec<String>),
    /// Anything that is neither a string nor an array (numbers, booleans, null, objects)
    Other(Value),
}

impl From<&Value> for MatchValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => MatchValue::Scalar(s.clone()),
            Value::Array(items) => MatchValue::Set(items.iter().map(value_to_text).collect()),
            other => MatchValue::Other(other.clone()),
        }
    }
}

impl From<Option<&Value>> for MatchValue {
    fn from(value: Option<&Value>) -> Self {
        value.map_or(MatchValue::Other(Value::Null), MatchValue::from)
    }
}

impl From<&str> for MatchValue {
    fn from(s: &str) -> Self {
        MatchValue::Scalar(s.to_string())
    }
}

impl From<String> for MatchValue {
    fn from(s: String) -> Self {
        MatchValue::Scalar(s)
    }
}

impl From<Vec<String>> for MatchValue {
    fn from(items: Vec<String>) -> Self {
        MatchValue::Set(items)
    }
}

impl From<&[&str]> for MatchValue {
    fn from(items: &[&str]) -> Self {
        MatchValue::Set(items.iter().map(|s| s.to_string()).collect())
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Containment test between a query and a value.
pub fn contains(query: &MatchValue, value: &MatchValue) -> bool {
    match (query, value) {
        (MatchValue::Scalar(q), MatchValue::Scalar(v)) => contains_ci(v, q),
        (MatchValue::Set(qs), MatchValue::Set(vs)) => qs
            .iter()
            .all(|q| vs.iter().any(|v| contains_ci(v, q))),
        (MatchValue::Scalar(q), MatchValue::Set(vs)) => vs.iter().any(|v| contains_ci(v, q)),
        (MatchValue::Set(qs), MatchValue::Scalar(v)) => qs.iter().any(|q| contains_ci(v, q)),
        (q, v) => q == v,
    }
}

/// Predicate over a single attribute value (`None` when the attribute is absent)
pub type AttributePredicate = Arc<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

/// How one attribute of a record is tested
#[derive(Clone)]
pub enum FieldMatch {
    Query(MatchValue),
    Predicate(AttributePredicate),
}

impl fmt::Debug for FieldMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldMatch::Query(q) => f.debug_tuple("Query").field(q).finish(),
            FieldMatch::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl FieldMatch {
    fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            FieldMatch::Predicate(predicate) => predicate(value),
            FieldMatch::Query(query) => contains(query, &MatchValue::from(value)),
        }
    }
}

/// Conjunction of per-attribute tests
#[derive(Debug, Clone, Default)]
pub struct MatchSpec {
    entries: Vec<(String, FieldMatch)>,
}

impl MatchSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to contain `query`
    pub fn query(mut self, field: impl Into<String>, query: impl Into<MatchValue>) -> Self {
        self.entries
            .push((field.into(), FieldMatch::Query(query.into())));
        self
    }

    /// Require `predicate` to hold for `field`
    pub fn predicate<F>(mut self, field: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        self.entries
            .push((field.into(), FieldMatch::Predicate(Arc::new(predicate))));
        self
    }

    /// Parse a `field=value` assignment. A value containing commas becomes a set query.
    pub fn with_assignment(self, assignment: &str) -> Result<Self, TrendError> {
        let (field, raw) = assignment.split_once('=').ok_or_else(|| {
            TrendError::InvalidParameter(format!(
                "match expression '{assignment}' must look like field=value"
            ))
        })?;
        let field = field.trim();
        if field.is_empty() {
            return Err(TrendError::InvalidParameter(format!(
                "match expression '{assignment}' has an empty field name"
            )));
        }

        let query = if raw.contains(',') {
            MatchValue::Set(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        } else {
            MatchValue::Scalar(raw.trim().to_string())
        };

        Ok(self.query(field, query))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True iff every entry matches the record
    pub fn matches(&self, record: &Record) -> bool {
        self.entries
            .iter()
            .all(|(field, test)| test.matches(record.get(field)))
    }
}

/// Keep the records that satisfy `spec`, in their original order.
pub fn filter(records: &[Record], spec: &MatchSpec) -> Vec<Record> {
    records
        .iter()
        .filter(|record| spec.matches(record))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scalar(s: &str) -> MatchValue {
        MatchValue::from(s)
    }

    fn set(items: &[&str]) -> MatchValue {
        MatchValue::from(items)
    }

    fn records() -> Vec<Record> {
        serde_json::from_value(json!([
            {"id": "1", "outcome": "success", "tags": ["Alice", "Bob"], "year": 2014},
            {"id": "2", "outcome": "failure", "tags": ["Carol"], "year": 2015},
            {"id": "3", "outcome": "Partial Success", "tags": ["bob"], "year": 2014},
            {"id": "4", "tags": ["Dave"]}
        ]))
        .unwrap()
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(|r| r.get_str("id")).collect()
    }

    #[test]
    fn test_scalar_scalar() {
        assert!(contains(&scalar("abc"), &scalar("xabcy")));
        assert!(contains(&scalar("ABC"), &scalar("xabcy")));
        assert!(!contains(&scalar("abd"), &scalar("xabcy")));
    }

    #[test]
    fn test_set_set() {
        assert!(contains(&set(&["a", "b"]), &set(&["alpha", "beta"])));
        assert!(!contains(&set(&["a", "z"]), &set(&["alpha", "beta"])));
        assert!(contains(&set(&[]), &set(&["alpha"])));
    }

    #[test]
    fn test_scalar_set() {
        assert!(contains(&scalar("et"), &set(&["alpha", "beta"])));
        assert!(!contains(&scalar("zz"), &set(&["alpha", "beta"])));
    }

    #[test]
    fn test_set_scalar() {
        assert!(contains(&set(&["zz", "ph"]), &scalar("alpha")));
        assert!(!contains(&set(&["zz"]), &scalar("alpha")));
    }

    #[test]
    fn test_strict_equality_fallback() {
        let five = MatchValue::Other(json!(5));
        assert!(contains(&five, &MatchValue::from(&json!(5))));
        assert!(!contains(&five, &MatchValue::from(&json!(6))));
        assert!(!contains(&scalar("5"), &MatchValue::from(&json!(5))));
        assert!(!contains(&scalar("x"), &MatchValue::from(None::<&Value>)));
        assert!(!contains(&set(&["x"]), &MatchValue::from(None::<&Value>)));
    }

    #[test]
    fn test_filter_preserves_order() {
        let spec = MatchSpec::new().query("outcome", "success");
        let kept = filter(&records(), &spec);
        assert_eq!(ids(&kept), vec!["1", "3"]);
    }

    #[test]
    fn test_filter_is_conjunctive() {
        let spec = MatchSpec::new()
            .query("outcome", "success")
            .query("tags", "alice");
        assert_eq!(ids(&filter(&records(), &spec)), vec!["1"]);
    }

    #[test]
    fn test_filter_with_predicate() {
        let spec = MatchSpec::new().predicate("year", |v| {
            v.and_then(Value::as_i64).is_some_and(|year| year >= 2015)
        });
        assert_eq!(ids(&filter(&records(), &spec)), vec!["2"]);

        let absent = MatchSpec::new().predicate("outcome", |v| v.is_none());
        assert_eq!(ids(&filter(&records(), &absent)), vec!["4"]);
    }

    #[test]
    fn test_filter_strict_equality_on_numbers() {
        let spec = MatchSpec::new().query("year", MatchValue::Other(json!(2014)));
        assert_eq!(ids(&filter(&records(), &spec)), vec!["1", "3"]);
    }

    #[test]
    fn test_empty_spec_keeps_everything() {
        assert_eq!(filter(&records(), &MatchSpec::new()).len(), 4);
    }

    #[test]
    fn test_assignment_parsing() {
        let spec = MatchSpec::new()
            .with_assignment("tags=bob, alice")
            .unwrap();
        assert_eq!(ids(&filter(&records(), &spec)), vec!["1"]);

        let spec = MatchSpec::new().with_assignment("tags=bob").unwrap();
        assert_eq!(ids(&filter(&records(), &spec)), vec!["1", "3"]);

        assert!(MatchSpec::new().with_assignment("novalue").is_err());
        assert!(MatchSpec::new().with_assignment("=x").is_err());
    }
}
