//! Advisory record validation

use crate::bucket::parse_day;
use crate::config::FieldNames;
use crate::types::{Outcome, Record};
use serde_json::Value;

/// A defect in one record. None of these stop the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordValidationError {
    #[error("missing date field '{0}'")]
    MissingDate(String),

    #[error("unparseable date '{0}'")]
    UnparseableDate(String),

    #[error("missing outcome field '{0}'")]
    MissingOutcome(String),

    #[error("unrecognized outcome '{0}' (expected win/success, loss/failure or draw/withdrawn)")]
    UnknownOutcome(String),

    #[error("tags field '{0}' is not a list of strings")]
    TagsNotStringList(String),
}

/// All defects found in one record
#[derive(Debug, Clone)]
pub struct RecordValidation {
    pub index: usize,
    pub record_id: Option<String>,
    pub errors: Vec<RecordValidationError>,
}

/// Check one record against the configured field names
pub fn validate_record(record: &Record, fields: &FieldNames) -> Vec<RecordValidationError> {
    let mut errors = Vec::new();

    match record.get(&fields.date) {
        None | Some(Value::Null) => {
            errors.push(RecordValidationError::MissingDate(fields.date.clone()))
        }
        Some(Value::String(text)) if parse_day(text).is_some() => {}
        Some(other) => errors.push(RecordValidationError::UnparseableDate(
            crate::types::value_to_text(other),
        )),
    }

    match record.get(&fields.outcome) {
        None | Some(Value::Null) => {
            errors.push(RecordValidationError::MissingOutcome(fields.outcome.clone()))
        }
        Some(Value::String(tag)) if Outcome::from_tag(tag).is_some() => {}
        Some(other) => errors.push(RecordValidationError::UnknownOutcome(
            crate::types::value_to_text(other),
        )),
    }

    if let Some(tags) = record.get(&fields.tags) {
        let is_string_list = tags
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string));
        if !is_string_list {
            errors.push(RecordValidationError::TagsNotStringList(fields.tags.clone()));
        }
    }

    errors
}
