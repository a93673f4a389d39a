//! Core types for the Outcome Trend pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw records, day buckets, rolling aggregate points and the derived,
//! chart-ready points handed to the rendering layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One event from the complaints log.
///
/// Records are opaque attribute maps. The pipeline only looks at the fields
/// named in [`crate::config::FieldNames`]; everything else passes through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    attributes: Map<String, Value>,
}

impl Record {
    /// Create a record from an attribute map
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self { attributes }
    }

    /// Get a raw attribute value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Get an attribute as a string slice, if it is a JSON string
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.attributes.get(field).and_then(Value::as_str)
    }

    /// Get an attribute as an ordered list of strings.
    ///
    /// Non-string array elements are rendered with their JSON text.
    pub fn get_tags(&self, field: &str) -> Option<Vec<String>> {
        match self.attributes.get(field)? {
            Value::Array(items) => Some(items.iter().map(value_to_text).collect()),
            _ => None,
        }
    }

    /// Borrow the full attribute map
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

impl From<Map<String, Value>> for Record {
    fn from(attributes: Map<String, Value>) -> Self {
        Self::new(attributes)
    }
}

/// Render a scalar JSON value as plain text (strings without quotes)
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Outcome vocabulary for a complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Complaint upheld
    Win,
    /// Complaint not upheld
    Loss,
    /// Complaint withdrawn or settled
    Draw,
}

impl Outcome {
    /// Classify an outcome tag. Unrecognized tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "win" | "success" => Some(Outcome::Win),
            "loss" | "failure" => Some(Outcome::Loss),
            "draw" | "withdrawn" | "withdrawal" => Some(Outcome::Draw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
            Outcome::Draw => "draw",
        }
    }
}

/// Per-bucket outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl OutcomeCounts {
    /// Increment the counter for an outcome
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    /// Count for a single outcome
    pub fn get(&self, outcome: Outcome) -> u32 {
        match outcome {
            Outcome::Win => self.wins,
            Outcome::Loss => self.losses,
            Outcome::Draw => self.draws,
        }
    }
}

/// All records for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    /// Calendar day (time of day stripped)
    pub date: NaiveDate,
    /// Records in input order
    pub records: Vec<Record>,
    /// Classified outcome counts
    pub counts: OutcomeCounts,
}

impl DayBucket {
    /// Create an empty bucket for a day
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            records: Vec::new(),
            counts: OutcomeCounts::default(),
        }
    }

    /// True when the bucket holds no records (synthetic gap filler or empty day)
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Rolling averages of outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeAverages {
    pub wins: f64,
    pub losses: f64,
    pub draws: f64,
}

/// One rolling-window output, dated at the last bucket of the window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatePoint {
    pub date: NaiveDate,
    /// Per-outcome averages over the window
    pub counts_avg: OutcomeAverages,
    /// Average number of records per day over the window
    pub total_avg: f64,
}

/// Aggregate point plus the success ratio, ready for charting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedPoint {
    #[serde(flatten)]
    pub point: AggregatePoint,
    /// wins / (wins + losses), 0 when the denominator is 0
    pub success_ratio: f64,
}

/// Producer metadata stamped on every series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Complete chart-ready series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSeries {
    pub producer: SeriesProducer,
    pub computed_at_utc: String,
    pub window_length: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub points: Vec<DerivedPoint>,
}
