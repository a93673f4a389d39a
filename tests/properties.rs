use chrono::{Duration, NaiveDate};
use outcome_trend::bucket::{is_contiguous, DayBucketizer};
use outcome_trend::types::{AggregatePoint, OutcomeAverages, Record};
use outcome_trend::{derive_percent, rolling_average, ComparatorChain};
use proptest::prelude::*;
use serde_json::json;

fn make_record(offset: i64, outcome: &str, id: u32) -> Record {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let date = base + Duration::days(offset);
    serde_json::from_value(json!({
        "id": format!("{}/{:03}", date.format("%y"), id),
        "date": date.format("%Y-%m-%d").to_string(),
        "outcome": outcome,
    }))
    .unwrap()
}

fn arb_records() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(
        (
            0i64..90,
            prop::sample::select(vec!["win", "loss", "draw", "pending"]),
            0u32..1000,
        ),
        0..60,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .map(|(offset, outcome, id)| make_record(offset, outcome, id))
            .collect()
    })
}

proptest! {
    #[test]
    fn sorting_twice_is_idempotent(records in arb_records()) {
        let chain = ComparatorChain::chronological("date", "id").unwrap();
        let mut once = records;
        chain.sort(&mut once);
        let mut twice = once.clone();
        chain.sort(&mut twice);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn buckets_are_contiguous_and_keep_every_record(records in arb_records()) {
        let chain = ComparatorChain::chronological("date", "id").unwrap();
        let mut sorted = records.clone();
        chain.sort(&mut sorted);

        let buckets = DayBucketizer::default().bucketize(sorted);
        prop_assert!(is_contiguous(&buckets));

        let kept: usize = buckets.iter().map(|b| b.records.len()).sum();
        prop_assert_eq!(kept, records.len());

        for bucket in &buckets {
            let counted = bucket.counts.wins + bucket.counts.losses + bucket.counts.draws;
            prop_assert!(counted as usize <= bucket.records.len());
        }
    }

    #[test]
    fn rolling_output_length(records in arb_records(), window in 1usize..20) {
        let buckets = DayBucketizer::default().bucketize(records);
        let points = rolling_average(&buckets, window).unwrap();
        prop_assert_eq!(points.len(), (buckets.len() + 1).saturating_sub(window));
        if let Some(last) = points.last() {
            prop_assert_eq!(Some(last.date), buckets.last().map(|b| b.date));
        }
    }

    #[test]
    fn success_ratio_is_bounded(
        wins in 0.0f64..100.0,
        losses in 0.0f64..100.0,
        draws in 0.0f64..100.0,
    ) {
        let point = AggregatePoint {
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            counts_avg: OutcomeAverages { wins, losses, draws },
            total_avg: wins + losses + draws,
        };
        let ratio = derive_percent(point).success_ratio;
        prop_assert!((0.0..=1.0).contains(&ratio));
        if wins + losses == 0.0 {
            prop_assert_eq!(ratio, 0.0);
        }
    }
}
