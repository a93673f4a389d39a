//! Multi-key record comparators
//!
//! A [`ComparatorChain`] is an ordered list of [`SortKey`]s evaluated first-key-wins:
//! the first key that does not tie decides the order. Each key can pull a sortable
//! token out of a composite field with a regex, either by substitution (capture
//! groups allowed in the replacement) or by taking the first match.
//!
//! Chains are immutable. [`ComparatorChain::then`] returns a new chain, so one
//! chain can be shared across several sorts.

use crate::error::TrendError;
use crate::types::{value_to_text, Record};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Value extracted from a record for one sort key
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
    /// Field absent, null, or the extract pattern found no match
    Missing,
}

impl SortValue {
    fn from_text(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(n) => SortValue::Number(n),
            Err(_) => SortValue::Text(text.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Number(_) => 0,
            SortValue::Text(_) => 1,
            SortValue::Missing => 2,
        }
    }

    /// Numeric comparison, totalized: numbers by value, then non-numeric text
    /// lexicographically, then missing values.
    pub fn numeric_cmp(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// Custom comparison for one key, applied to the two extracted values
pub type Tiebreak = Arc<dyn Fn(&SortValue, &SortValue) -> Ordering + Send + Sync>;

/// Serializable description of a sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKeyDescriptor {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

impl SortKeyDescriptor {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            extract_pattern: None,
            replacement: None,
        }
    }

    /// Compile the descriptor, validating its pattern
    pub fn compile(&self) -> Result<SortKey, TrendError> {
        let key = SortKey::new(self.field.clone());
        match (&self.extract_pattern, &self.replacement) {
            (Some(pattern), Some(replacement)) => key.replace(pattern, replacement.clone()),
            (Some(pattern), None) => key.extract(pattern),
            (None, Some(_)) => Err(TrendError::InvalidParameter(format!(
                "sort key '{}' has a replacement but no extract pattern",
                self.field
            ))),
            (None, None) => Ok(key),
        }
    }
}

/// One evaluation step in a comparator chain
#[derive(Clone)]
pub struct SortKey {
    field: String,
    pattern: Option<Regex>,
    replacement: Option<String>,
    tiebreak: Option<Tiebreak>,
}

impl fmt::Debug for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortKey")
            .field("field", &self.field)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("replacement", &self.replacement)
            .field("tiebreak", &self.tiebreak.is_some())
            .finish()
    }
}

impl SortKey {
    /// Compare `field` numerically as-is
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            pattern: None,
            replacement: None,
            tiebreak: None,
        }
    }

    /// Use the first match of `pattern` as the key value
    pub fn extract(mut self, pattern: &str) -> Result<Self, TrendError> {
        self.pattern = Some(Regex::new(pattern)?);
        self.replacement = None;
        Ok(self)
    }

    /// Substitute the first match of `pattern` with `replacement` (`$1` etc. allowed)
    pub fn replace(
        mut self,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, TrendError> {
        self.pattern = Some(Regex::new(pattern)?);
        self.replacement = Some(replacement.into());
        Ok(self)
    }

    /// Compare extracted values with `tiebreak` instead of numerically
    pub fn with_tiebreak<F>(mut self, tiebreak: F) -> Self
    where
        F: Fn(&SortValue, &SortValue) -> Ordering + Send + Sync + 'static,
    {
        self.tiebreak = Some(Arc::new(tiebreak));
        self
    }

    pub fn field_name(&self) -> &str {
        &self.field
    }

    fn raw<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        record.get(&self.field).filter(|v| !v.is_null())
    }

    /// Extract this key's value from a record
    pub fn value_of(&self, record: &Record) -> SortValue {
        let Some(raw) = self.raw(record) else {
            return SortValue::Missing;
        };

        let Some(pattern) = &self.pattern else {
            return match raw {
                Value::Number(n) => n.as_f64().map_or(SortValue::Missing, SortValue::Number),
                other => SortValue::from_text(&value_to_text(other)),
            };
        };

        let text = value_to_text(raw);
        match &self.replacement {
            Some(replacement) => {
                SortValue::from_text(&pattern.replacen(&text, 1, replacement.as_str()))
            }
            None => pattern
                .find(&text)
                .map_or(SortValue::Missing, |m| SortValue::from_text(m.as_str())),
        }
    }

    /// Compare two records on this key alone
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let va = self.value_of(a);
        let vb = self.value_of(b);
        match &self.tiebreak {
            Some(tiebreak) => tiebreak(&va, &vb),
            None => va.numeric_cmp(&vb),
        }
    }
}

/// Ordered list of sort keys combined first-key-wins
#[derive(Debug, Clone, Default)]
pub struct ComparatorChain {
    keys: Vec<SortKey>,
}

impl ComparatorChain {
    /// Start a chain with its primary key
    pub fn by_key(key: SortKey) -> Self {
        Self { keys: vec![key] }
    }

    /// New chain that evaluates this chain first, then `key` on ties
    pub fn then(&self, key: SortKey) -> Self {
        let mut keys = self.keys.clone();
        keys.push(key);
        Self { keys }
    }

    /// Build a chain from descriptors
    pub fn from_descriptors(descriptors: &[SortKeyDescriptor]) -> Result<Self, TrendError> {
        let keys = descriptors
            .iter()
            .map(SortKeyDescriptor::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { keys })
    }

    /// Year, month and day pulled out of `date_field`, then the trailing number of `id_field`.
    pub fn chronological(date_field: &str, id_field: &str) -> Result<Self, TrendError> {
        Self::from_descriptors(&chronological_descriptors(date_field, id_field))
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Lenient comparison: never fails, missing values sort last
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        self.keys
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Comparison that rejects records missing any key field
    pub fn try_compare(&self, a: &Record, b: &Record) -> Result<Ordering, TrendError> {
        self.check_fields(a)?;
        self.check_fields(b)?;
        Ok(self.compare(a, b))
    }

    /// Stable sort with the lenient comparison
    pub fn sort(&self, records: &mut [Record]) {
        records.sort_by(|a, b| self.compare(a, b));
    }

    /// Stable sort that first checks every record carries every key field.
    ///
    /// On error the slice is left untouched.
    pub fn try_sort(&self, records: &mut [Record]) -> Result<(), TrendError> {
        for record in records.iter() {
            self.check_fields(record)?;
        }
        self.sort(records);
        Ok(())
    }

    fn check_fields(&self, record: &Record) -> Result<(), TrendError> {
        match self.keys.iter().find(|key| key.raw(record).is_none()) {
            Some(key) => Err(TrendError::MissingField(key.field.clone())),
            None => Ok(()),
        }
    }
}

/// Descriptors behind [`ComparatorChain::chronological`]
pub fn chronological_descriptors(date_field: &str, id_field: &str) -> Vec<SortKeyDescriptor> {
    let date_part = |group: &str| SortKeyDescriptor {
        field: date_field.to_string(),
        extract_pattern: Some(r"^(\d+)-(\d+)-(\d+).*$".to_string()),
        replacement: Some(group.to_string()),
    };

    vec![
        date_part("$1"),
        date_part("$2"),
        date_part("$3"),
        SortKeyDescriptor {
            field: id_field.to_string(),
            extract_pattern: Some(r"\d+$".to_string()),
            replacement: None,
        },
    ]
}
