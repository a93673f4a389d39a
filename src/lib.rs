//! Outcome Trend - rolling outcome series from sparse complaint logs
//!
//! Outcome Trend turns an irregularly dated log of categorical events (complaints
//! and their outcomes) into a dense, day-by-day series suitable for charting,
//! through a deterministic pipeline: filtering → multi-key sort → day bucketing
//! with gap filling → trailing rolling averages → success ratio.
//!
//! ## Modules
//!
//! - **Matching**: case-insensitive containment over strings and string sets
//! - **Sorting**: chainable multi-key comparators with regex field extraction
//! - **Aggregation**: contiguous day buckets, rolling windows, success ratio

pub mod bucket;
pub mod comparator;
pub mod config;
pub mod encoder;
pub mod error;
pub mod matcher;
pub mod participants;
pub mod percent;
pub mod pipeline;
pub mod rolling;
pub mod schema;
pub mod types;

pub use bucket::DayBucketizer;
pub use comparator::{ComparatorChain, SortKey, SortKeyDescriptor};
pub use config::PipelineConfig;
pub use error::TrendError;
pub use matcher::{contains, filter, MatchSpec, MatchValue};
pub use percent::derive_percent;
pub use pipeline::{payload_to_series, TrendPipeline};
pub use rolling::rolling_average;

// Schema exports
pub use schema::ComplaintsAdapter;

/// Crate version embedded in every series
pub const TREND_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for series payloads
pub const PRODUCER_NAME: &str = "outcome-trend";
