//! Pipeline orchestration
//!
//! This module provides the public API for Outcome Trend. It runs records through
//! every stage in order and hands back a chart-ready series:
//!
//! 1. `MatchSpec` - optional ad hoc filtering
//! 2. `DateBounds` - drop records dated outside the plausible range
//! 3. `ComparatorChain` - chronological sort with deterministic tie-breaks
//! 4. `DayBucketizer` - contiguous calendar-day buckets
//! 5. `rolling_average` - trailing-window averages
//! 6. `derive_series` - success ratio per point

use crate::bucket::DayBucketizer;
use crate::comparator::ComparatorChain;
use crate::config::PipelineConfig;
use crate::encoder::SeriesEncoder;
use crate::error::TrendError;
use crate::matcher::MatchSpec;
use crate::percent::derive_series;
use crate::rolling::rolling_average;
use crate::schema::ComplaintsAdapter;
use crate::types::{DayBucket, DerivedPoint, Record, TrendSeries};
use tracing::{debug, warn};

/// Convert a raw complaints payload into a JSON trend series (stateless, one-shot).
///
/// # Arguments
/// * `raw_json` - Complaints payload (see [`ComplaintsAdapter::parse_payload`])
/// * `window_length` - Rolling window in days
///
/// # Example
/// ```ignore
/// let series_json = payload_to_series(payload, 30)?;
/// ```
pub fn payload_to_series(raw_json: String, window_length: usize) -> Result<String, TrendError> {
    let pipeline =
        TrendPipeline::new(PipelineConfig::default().with_window_length(window_length))?;
    pipeline.run_json(&raw_json)
}

/// Configured pipeline. Immutable once built, so one instance can serve many runs.
pub struct TrendPipeline {
    config: PipelineConfig,
    comparator: ComparatorChain,
    bucketizer: DayBucketizer,
    filter: MatchSpec,
    encoder: SeriesEncoder,
}

impl TrendPipeline {
    /// Build a pipeline, validating the configuration
    pub fn new(config: PipelineConfig) -> Result<Self, TrendError> {
        config.validate()?;
        let comparator = config.comparator()?;
        let bucketizer =
            DayBucketizer::new(&config.fields).with_policy(config.unparseable_dates);

        Ok(Self {
            config,
            comparator,
            bucketizer,
            filter: MatchSpec::new(),
            encoder: SeriesEncoder::new(),
        })
    }

    /// Only keep records matching `spec`
    pub fn with_filter(mut self, spec: MatchSpec) -> Self {
        self.filter = spec;
        self
    }

    /// Use a specific encoder (e.g. a fixed instance ID)
    pub fn with_encoder(mut self, encoder: SeriesEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Filter, bound and sort records
    pub fn prepare(&self, mut records: Vec<Record>) -> Vec<Record> {
        let received = records.len();

        if !self.filter.is_empty() {
            records.retain(|record| self.filter.matches(record));
        }
        let matched = records.len();

        if let Some(bounds) = &self.config.date_bounds {
            records.retain(|record| {
                self.bucketizer
                    .day_of(record)
                    .map_or(true, |day| bounds.contains(day))
            });
            let out_of_range = matched - records.len();
            if out_of_range > 0 {
                warn!(out_of_range, ?bounds, "dropped records dated outside bounds");
            }
        }

        self.comparator.sort(&mut records);

        debug!(received, matched, kept = records.len(), "prepared records");
        records
    }

    /// Prepared records grouped into contiguous day buckets
    pub fn buckets(&self, records: Vec<Record>) -> Vec<DayBucket> {
        self.bucketizer.bucketize(self.prepare(records))
    }

    /// Rolling, ratio-annotated points for `records`
    pub fn derive(&self, records: Vec<Record>) -> Result<Vec<DerivedPoint>, TrendError> {
        let buckets = self.buckets(records);
        let points = rolling_average(&buckets, self.config.window_length)?;
        Ok(derive_series(points))
    }

    /// Full run producing an encoded series
    pub fn run(&self, records: Vec<Record>) -> Result<TrendSeries, TrendError> {
        let points = self.derive(records)?;
        Ok(self.encoder.encode(points, self.config.window_length))
    }

    /// Parse a complaints payload and run it to a JSON series
    pub fn run_json(&self, raw_json: &str) -> Result<String, TrendError> {
        let records = ComplaintsAdapter::parse_payload(raw_json)?;
        let series = self.run(records)?;
        serde_json::to_string_pretty(&series).map_err(TrendError::JsonError)
    }
}
