//! Pipeline configuration
//!
//! Everything a pipeline run needs, as one immutable value: which attributes hold
//! the date, outcome, tags and id, how records are sorted, which days are in
//! range, and the rolling window length. Loadable from JSON; every field has a
//! default.

use crate::bucket::{parse_day, UnparseableDatePolicy};
use crate::comparator::{chronological_descriptors, ComparatorChain, SortKeyDescriptor};
use crate::error::TrendError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default rolling window in days
pub const DEFAULT_WINDOW_LENGTH: usize = 30;

/// Attribute names the pipeline reads from each record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub date: String,
    pub outcome: String,
    pub tags: String,
    pub id: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            outcome: "outcome".to_string(),
            tags: "tags".to_string(),
            id: "id".to_string(),
        }
    }
}

/// Exclusive bounds on a record's calendar day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<NaiveDate>,
}

impl DateBounds {
    /// The 2008..2050 window the complaints log has always been clipped to
    pub fn plausible() -> Self {
        Self {
            after: NaiveDate::from_ymd_opt(2008, 1, 1),
            before: NaiveDate::from_ymd_opt(2050, 1, 1),
        }
    }

    /// Parse optional `YYYY-MM-DD` bounds
    pub fn parse(after: Option<&str>, before: Option<&str>) -> Result<Self, TrendError> {
        let parse = |text: &str| {
            parse_day(text)
                .ok_or_else(|| TrendError::DateParseError(format!("invalid date bound '{text}'")))
        };
        Ok(Self {
            after: after.map(parse).transpose()?,
            before: before.map(parse).transpose()?,
        })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.after.map_or(true, |after| day > after)
            && self.before.map_or(true, |before| day < before)
    }

    pub fn is_unbounded(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rolling window length in days (>= 1)
    pub window_length: usize,
    pub fields: FieldNames,
    /// Sort keys; empty means chronological on `fields.date` then `fields.id`
    pub sort_keys: Vec<SortKeyDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_bounds: Option<DateBounds>,
    pub unparseable_dates: UnparseableDatePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_length: DEFAULT_WINDOW_LENGTH,
            fields: FieldNames::default(),
            sort_keys: Vec::new(),
            date_bounds: None,
            unparseable_dates: UnparseableDatePolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_window_length(mut self, window_length: usize) -> Self {
        self.window_length = window_length;
        self
    }

    pub fn with_fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_date_bounds(mut self, bounds: DateBounds) -> Self {
        self.date_bounds = (!bounds.is_unbounded()).then_some(bounds);
        self
    }

    /// Load configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, TrendError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, TrendError> {
        serde_json::to_string_pretty(self).map_err(|e| TrendError::EncodingError(e.to_string()))
    }

    /// Reject a zero window and compile every sort pattern
    pub fn validate(&self) -> Result<(), TrendError> {
        if self.window_length == 0 {
            return Err(TrendError::InvalidParameter(
                "window_length must be at least 1".to_string(),
            ));
        }
        self.comparator().map(|_| ())
    }

    /// Effective sort key descriptors
    pub fn sort_descriptors(&self) -> Vec<SortKeyDescriptor> {
        if self.sort_keys.is_empty() {
            chronological_descriptors(&self.fields.date, &self.fields.id)
        } else {
            self.sort_keys.clone()
        }
    }

    /// Compile the configured comparator chain
    pub fn comparator(&self) -> Result<ComparatorChain, TrendError> {
        ComparatorChain::from_descriptors(&self.sort_descriptors())
    }
}
