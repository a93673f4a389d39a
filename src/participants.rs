//! Participant index and highlighting
//!
//! Groups records by the participants named in their tags attribute, using the
//! same containment rules as [`crate::matcher`], and answers the "does this
//! record involve anyone from that one" question used for highlighting.

use crate::matcher::{contains, filter, MatchSpec, MatchValue};
use crate::types::Record;
use serde::Serialize;
use tracing::debug;

/// Records attributed to one participant
#[derive(Debug, Clone)]
pub struct ParticipantEntry {
    pub name: String,
    pub records: Vec<Record>,
}

/// Participant name with its record count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantCount {
    pub name: String,
    pub count: usize,
}

/// Participants ranked ascending by record count
#[derive(Debug, Clone, Default)]
pub struct ParticipantIndex {
    entries: Vec<ParticipantEntry>,
}

impl ParticipantIndex {
    /// Index `records` for every name in `members`.
    ///
    /// Ranking is stable: participants with equal counts keep member order.
    pub fn build(records: &[Record], members: &[String], tags_field: &str) -> Self {
        let mut entries: Vec<ParticipantEntry> = members
            .iter()
            .map(|name| ParticipantEntry {
                name: name.clone(),
                records: filter(records, &MatchSpec::new().query(tags_field, name.as_str())),
            })
            .collect();
        entries.sort_by_key(|entry| entry.records.len());

        debug!(
            participants = entries.len(),
            records = records.len(),
            "built participant index"
        );
        Self { entries }
    }

    /// Build from the distinct tags found in `records`, in first-seen order
    pub fn from_records(records: &[Record], tags_field: &str) -> Self {
        let mut members: Vec<String> = Vec::new();
        for tag in records.iter().filter_map(|r| r.get_tags(tags_field)).flatten() {
            if !members.contains(&tag) {
                members.push(tag);
            }
        }
        Self::build(records, &members, tags_field)
    }

    pub fn ranked(&self) -> &[ParticipantEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ParticipantEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn counts(&self) -> Vec<ParticipantCount> {
        self.entries
            .iter()
            .map(|entry| ParticipantCount {
                name: entry.name.clone(),
                count: entry.records.len(),
            })
            .collect()
    }
}

/// True iff `record`'s tags mention `participant`
pub fn involves(record: &Record, participant: &str, tags_field: &str) -> bool {
    contains(
        &MatchValue::from(participant),
        &MatchValue::from(record.get(tags_field)),
    )
}

/// True iff any participant tagged on `a` is mentioned in `b`'s tags
pub fn shares_participant(a: &Record, b: &Record, tags_field: &str) -> bool {
    let Some(tags) = a.get_tags(tags_field) else {
        return false;
    };
    let other = MatchValue::from(b.get(tags_field));
    tags.into_iter()
        .any(|tag| contains(&MatchValue::Scalar(tag), &other))
}
