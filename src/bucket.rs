//! Day bucketing
//!
//! Groups time-ascending records into calendar-day buckets, then fills every
//! missing day with an empty bucket so the sequence is contiguous: sorted
//! ascending, no duplicate dates, and adjacent dates exactly one day apart.

use crate::config::FieldNames;
use crate::types::{DayBucket, Outcome, OutcomeCounts, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What to do with records whose date does not parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparseableDatePolicy {
    /// Append to the first bucket created (held until one exists)
    #[default]
    AttachToFirst,
    /// Leave the record out of the bucket sequence
    Discard,
}

/// Parse a date attribute to a calendar day, discarding any time of day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DD[ T]HH:MM:SS`.
pub fn parse_day(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(day);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

/// True iff buckets are ascending with adjacent dates exactly one day apart
pub fn is_contiguous(buckets: &[DayBucket]) -> bool {
    buckets
        .windows(2)
        .all(|pair| pair[0].date.succ_opt() == Some(pair[1].date))
}

/// Builds contiguous day buckets from sorted records
#[derive(Debug, Clone)]
pub struct DayBucketizer {
    date_field: String,
    outcome_field: String,
    unparseable: UnparseableDatePolicy,
}

impl Default for DayBucketizer {
    fn default() -> Self {
        Self::new(&FieldNames::default())
    }
}

impl DayBucketizer {
    pub fn new(fields: &FieldNames) -> Self {
        Self {
            date_field: fields.date.clone(),
            outcome_field: fields.outcome.clone(),
            unparseable: UnparseableDatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UnparseableDatePolicy) -> Self {
        self.unparseable = policy;
        self
    }

    /// Calendar day of a record, if its date attribute parses
    pub fn day_of(&self, record: &Record) -> Option<NaiveDate> {
        record.get_str(&self.date_field).and_then(parse_day)
    }

    /// Bucket `sorted_records` by day and gap-fill.
    ///
    /// Input is expected to be time-ascending; intra-day order is kept as given.
    pub fn bucketize(&self, sorted_records: Vec<Record>) -> Vec<DayBucket> {
        let total = sorted_records.len();
        let mut by_day: BTreeMap<NaiveDate, Vec<Record>> = BTreeMap::new();
        let mut first_day: Option<NaiveDate> = None;
        let mut pending: Vec<Record> = Vec::new();
        let mut unparseable = 0usize;

        for record in sorted_records {
            match self.day_of(&record) {
                Some(day) => {
                    if first_day.is_none() {
                        first_day = Some(day);
                        by_day.entry(day).or_default().append(&mut pending);
                    }
                    by_day.entry(day).or_default().push(record);
                }
                None => {
                    unparseable += 1;
                    match (self.unparseable, first_day) {
                        (UnparseableDatePolicy::Discard, _) => {}
                        (UnparseableDatePolicy::AttachToFirst, Some(day)) => {
                            by_day.entry(day).or_default().push(record);
                        }
                        (UnparseableDatePolicy::AttachToFirst, None) => pending.push(record),
                    }
                }
            }
        }

        if unparseable > 0 {
            warn!(
                unparseable,
                policy = ?self.unparseable,
                field = %self.date_field,
                "records with unparseable dates"
            );
        }
        if !pending.is_empty() {
            warn!(
                dropped = pending.len(),
                "no parseable date in input; records have no bucket to attach to"
            );
        }

        let (Some(&start), Some(&end)) = (by_day.keys().next(), by_day.keys().next_back()) else {
            return Vec::new();
        };

        let span = (end - start).num_days().max(0) as usize + 1;
        let mut buckets = Vec::with_capacity(span);
        let mut day = start;
        loop {
            let records = by_day.remove(&day).unwrap_or_default();
            buckets.push(self.make_bucket(day, records));
            if day >= end {
                break;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        let synthetic = buckets.iter().filter(|b| b.is_empty()).count();
        debug!(
            records = total,
            buckets = buckets.len(),
            synthetic,
            first = %start,
            last = %end,
            "bucketized records by day"
        );

        buckets
    }

    fn make_bucket(&self, date: NaiveDate, records: Vec<Record>) -> DayBucket {
        let mut counts = OutcomeCounts::default();
        let mut unrecognized = 0usize;
        for record in &records {
            match record
                .get_str(&self.outcome_field)
                .and_then(Outcome::from_tag)
            {
                Some(outcome) => counts.record(outcome),
                None => unrecognized += 1,
            }
        }
        if unrecognized > 0 {
            debug!(%date, unrecognized, "outcomes outside vocabulary left uncounted");
        }

        DayBucket {
            date,
            records,
            counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn records(value: Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(bucket: &DayBucket) -> Vec<&str> {
        bucket.records.iter().filter_map(|r| r.get_str("id")).collect()
    }

    #[test]
    fn test_parse_day_formats() {
        assert_eq!(parse_day("2020-01-03"), Some(day(2020, 1, 3)));
        assert_eq!(parse_day(" 2020-1-3 "), Some(day(2020, 1, 3)));
        assert_eq!(parse_day("2020-01-03T22:15:00Z"), Some(day(2020, 1, 3)));
        assert_eq!(parse_day("2020-01-03 08:00:00"), Some(day(2020, 1, 3)));
        assert_eq!(parse_day(""), None);
        assert_eq!(parse_day("2020-02-30"), None);
        assert_eq!(parse_day("soon"), None);
    }

    #[test]
    fn test_gap_is_filled() {
        let input = records(json!([
            {"id": "a", "date": "2020-01-01", "outcome": "win"},
            {"id": "b", "date": "2020-01-03", "outcome": "loss"}
        ]));
        let buckets = DayBucketizer::default().bucketize(input);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].date, day(2020, 1, 1));
        assert_eq!(buckets[0].counts.wins, 1);
        assert_eq!(buckets[1].date, day(2020, 1, 2));
        assert!(buckets[1].is_empty());
        assert_eq!(buckets[1].counts, OutcomeCounts::default());
        assert_eq!(buckets[2].date, day(2020, 1, 3));
        assert_eq!(buckets[2].counts.losses, 1);
        assert!(is_contiguous(&buckets));
    }

    #[test]
    fn test_success_and_failure_tags_counted() {
        let input = records(json!([
            {"date": "2020-01-01", "outcome": "success"},
            {"date": "2020-01-03", "outcome": "failure"}
        ]));
        let buckets = DayBucketizer::default().bucketize(input);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].date, day(2020, 1, 1));
        assert_eq!(buckets[0].counts.wins, 1);
        assert!(buckets[1].is_empty());
        assert_eq!(buckets[2].date, day(2020, 1, 3));
        assert_eq!(buckets[2].counts.losses, 1);
    }

    #[test]
    fn test_same_day_grouped_in_order() {
        let input = records(json!([
            {"id": "a", "date": "2020-01-01", "outcome": "win"},
            {"id": "b", "date": "2020-01-01T10:00:00Z", "outcome": "draw"},
            {"id": "c", "date": "2020-01-01", "outcome": "win"}
        ]));
        let buckets = DayBucketizer::default().bucketize(input);

        assert_eq!(buckets.len(), 1);
        assert_eq!(ids(&buckets[0]), vec!["a", "b", "c"]);
        assert_eq!(
            buckets[0].counts,
            OutcomeCounts {
                wins: 2,
                losses: 0,
                draws: 1
            }
        );
    }

    #[test]
    fn test_unrecognized_outcome_kept_but_uncounted() {
        let input = records(json!([
            {"id": "a", "date": "2020-01-01", "outcome": "pending"},
            {"id": "b", "date": "2020-01-01"}
        ]));
        let buckets = DayBucketizer::default().bucketize(input);
        assert_eq!(buckets[0].records.len(), 2);
        assert_eq!(buckets[0].counts, OutcomeCounts::default());
    }

    #[test]
    fn test_unparseable_dates_attach_to_first_bucket() {
        let input = records(json!([
            {"id": "early-bad", "date": "", "outcome": "win"},
            {"id": "a", "date": "2020-01-01", "outcome": "loss"},
            {"id": "b", "date": "2020-01-02", "outcome": "win"},
            {"id": "late-bad", "outcome": "draw"}
        ]));
        let buckets = DayBucketizer::default().bucketize(input);

        assert_eq!(buckets.len(), 2);
        assert_eq!(ids(&buckets[0]), vec!["early-bad", "a", "late-bad"]);
        assert_eq!(
            buckets[0].counts,
            OutcomeCounts {
                wins: 1,
                losses: 1,
                draws: 1
            }
        );
        assert_eq!(ids(&buckets[1]), vec!["b"]);
    }

    #[test]
    fn test_unparseable_dates_discarded() {
        let input = records(json!([
            {"id": "a", "date": "2020-01-01", "outcome": "loss"},
            {"id": "bad", "date": "n/a", "outcome": "win"}
        ]));
        let buckets = DayBucketizer::default()
            .with_policy(UnparseableDatePolicy::Discard)
            .bucketize(input);
        assert_eq!(ids(&buckets[0]), vec!["a"]);
        assert_eq!(buckets[0].counts.wins, 0);
    }

    #[test]
    fn test_no_parseable_dates_yields_no_buckets() {
        let input = records(json!([{"id": "bad", "date": "??"}]));
        assert!(DayBucketizer::default().bucketize(input).is_empty());
        assert!(DayBucketizer::default().bucketize(Vec::new()).is_empty());
    }

    #[test]
    fn test_unsorted_input_still_contiguous() {
        let input = records(json!([
            {"id": "b", "date": "2020-01-05"},
            {"id": "a", "date": "2020-01-01"},
            {"id": "c", "date": "2020-01-05"}
        ]));
        let buckets = DayBucketizer::default().bucketize(input);
        assert_eq!(buckets.len(), 5);
        assert!(is_contiguous(&buckets));
        assert_eq!(ids(&buckets[4]), vec!["b", "c"]);
    }

    #[test]
    fn test_custom_field_names() {
        let fields = FieldNames {
            date: "meetingdate".to_string(),
            outcome: "result".to_string(),
            ..FieldNames::default()
        };
        let input = records(json!([
            {"meetingdate": "2014-05-01", "result": "win"},
            {"meetingdate": "2014-05-04", "result": "draw"}
        ]));
        let buckets = DayBucketizer::new(&fields).bucketize(input);
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[3].counts.draws, 1);
    }
}
