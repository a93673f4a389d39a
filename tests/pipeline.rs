use chrono::NaiveDate;
use outcome_trend::config::{DateBounds, FieldNames, PipelineConfig};
use outcome_trend::encoder::SeriesEncoder;
use outcome_trend::participants::{shares_participant, ParticipantIndex};
use outcome_trend::{ComplaintsAdapter, MatchSpec, TrendPipeline};
use pretty_assertions::assert_eq;

fn sample_payload() -> &'static str {
    r#"{
        "complaints": {
            "14/120": {"idslash": "14/120", "meetingdate": "2014-03-04", "result": "loss",
                       "complainants": ["Ann Smith"], "advert": "Sports drink"},
            "14/101": {"idslash": "14/101", "meetingdate": "2014-03-01", "result": "win",
                       "complainants": ["Ann Smith", "Bo Lee"], "advert": "Car dealer"},
            "14/102": {"idslash": "14/102", "meetingdate": "2014-03-01", "result": "draw",
                       "complainants": ["Bo Lee"], "advert": "Bank"},
            "14/130": {"idslash": "14/130", "meetingdate": "2014-03-05", "result": "win",
                       "complainants": ["Cy Tan"], "advert": "Supermarket"},
            "14/999": {"idslash": "14/999", "meetingdate": "", "result": "win",
                       "complainants": ["Cy Tan"], "advert": "Unknown"},
            "98/001": {"idslash": "98/001", "meetingdate": "1998-01-01", "result": "loss",
                       "complainants": ["Di Wu"], "advert": "Archive"}
        }
    }"#
}

fn config(window: usize) -> PipelineConfig {
    PipelineConfig::default()
        .with_window_length(window)
        .with_fields(FieldNames {
            date: "meetingdate".to_string(),
            outcome: "result".to_string(),
            tags: "complainants".to_string(),
            id: "idslash".to_string(),
        })
        .with_date_bounds(DateBounds::parse(Some("2008-01-01"), Some("2050-01-01")).unwrap())
}

#[test]
fn end_to_end_series() {
    let records = ComplaintsAdapter::parse_payload(sample_payload()).unwrap();
    let pipeline = TrendPipeline::new(config(2))
        .unwrap()
        .with_encoder(SeriesEncoder::with_instance_id("test".to_string()));

    let buckets = pipeline.buckets(records.clone());
    let days: Vec<_> = buckets.iter().map(|b| b.date.to_string()).collect();
    assert_eq!(
        days,
        vec!["2014-03-01", "2014-03-02", "2014-03-03", "2014-03-04", "2014-03-05"]
    );

    // Unparseable date lands in the first bucket after the sorted records of that day
    let first_ids: Vec<_> = buckets[0]
        .records
        .iter()
        .filter_map(|r| r.get_str("idslash"))
        .collect();
    assert_eq!(first_ids, vec!["14/101", "14/102", "14/999"]);
    assert_eq!(buckets[0].counts.wins, 2);

    let series = pipeline.run(records).unwrap();
    assert_eq!(series.points.len(), 4);
    assert_eq!(series.first_date, NaiveDate::from_ymd_opt(2014, 3, 2));
    assert_eq!(series.last_date, NaiveDate::from_ymd_opt(2014, 3, 5));

    // Mar 1 + Mar 2: 2 wins, 0 losses, 1 draw over 2 days
    let first = &series.points[0];
    assert_eq!(first.point.counts_avg.wins, 1.0);
    assert_eq!(first.point.counts_avg.draws, 0.5);
    assert_eq!(first.point.total_avg, 1.5);
    assert_eq!(first.success_ratio, 1.0);

    // Mar 2 + Mar 3: nothing decided
    assert_eq!(series.points[1].success_ratio, 0.0);

    // Mar 4 + Mar 5: one loss, one win
    assert_eq!(series.points[3].success_ratio, 0.5);
}

#[test]
fn filtered_series_for_one_participant() {
    let records = ComplaintsAdapter::parse_payload(sample_payload()).unwrap();
    let pipeline = TrendPipeline::new(config(1))
        .unwrap()
        .with_filter(MatchSpec::new().query("complainants", "ann"));

    let points = pipeline.derive(records).unwrap();
    let ratios: Vec<_> = points.iter().map(|p| p.success_ratio).collect();
    assert_eq!(ratios, vec![1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn participant_ranking_and_highlight() {
    let records = ComplaintsAdapter::parse_payload(sample_payload()).unwrap();
    let members = ComplaintsAdapter::parse_members(
        r#"{"complainants": {"Ann Smith": {}, "Bo Lee": {}, "Cy Tan": {}, "Di Wu": {}}}"#,
    )
    .unwrap();

    let index = ParticipantIndex::build(&records, &members, "complainants");
    let ranked: Vec<_> = index
        .counts()
        .into_iter()
        .map(|c| (c.name, c.count))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("Di Wu".to_string(), 1),
            ("Ann Smith".to_string(), 2),
            ("Bo Lee".to_string(), 2),
            ("Cy Tan".to_string(), 2),
        ]
    );

    // records[0] is 14/120 (Ann), records[1] is 14/101 (Ann, Bo)
    assert!(shares_participant(&records[0], &records[1], "complainants"));
    assert!(!shares_participant(&records[0], &records[2], "complainants"));
}

#[test]
fn validation_flags_unplaceable_records() {
    let records = ComplaintsAdapter::parse_payload(sample_payload()).unwrap();
    let report = ComplaintsAdapter::validate_records(&records, &config(1).fields);
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].record_id.as_deref(), Some("14/999"));
}
