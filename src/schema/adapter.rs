//! Adapter from complaints payloads to records

use crate::config::FieldNames;
use crate::error::TrendError;
use crate::schema::validation::{validate_record, RecordValidation};
use crate::types::Record;
use serde_json::Value;
use tracing::debug;

/// Adapter for converting complaints JSON into records
pub struct ComplaintsAdapter;

impl ComplaintsAdapter {
    /// Parse a complaints payload.
    ///
    /// Accepted shapes, in document order:
    /// - `{"complaints": {"<id>": {..}, ..}}`
    /// - `{"complaints": [{..}, ..]}`
    /// - `[{..}, ..]`
    pub fn parse_payload(json: &str) -> Result<Vec<Record>, TrendError> {
        let value: Value = serde_json::from_str(json)?;
        let records = match value {
            Value::Array(items) => Self::collect_records(items)?,
            Value::Object(mut root) => match root.remove("complaints") {
                Some(Value::Object(keyed)) => {
                    Self::collect_records(keyed.into_iter().map(|(_, v)| v))?
                }
                Some(Value::Array(items)) => Self::collect_records(items)?,
                Some(_) => {
                    return Err(TrendError::ParseError(
                        "'complaints' must be an object or an array".to_string(),
                    ))
                }
                None => return Err(TrendError::MissingField("complaints".to_string())),
            },
            _ => {
                return Err(TrendError::ParseError(
                    "payload must be a JSON object or array".to_string(),
                ))
            }
        };

        debug!(records = records.len(), "parsed complaints payload");
        Ok(records)
    }

    /// Parse NDJSON with one record object per line
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<Record>, TrendError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(map)) => records.push(Record::new(map)),
                Ok(_) => {
                    return Err(TrendError::ParseError(format!(
                        "Line {} is not a JSON object",
                        line_num + 1
                    )));
                }
                Err(e) => {
                    return Err(TrendError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse the participant list: `{"complainants": {"<name>": ..}}` or `["<name>", ..]`
    pub fn parse_members(json: &str) -> Result<Vec<String>, TrendError> {
        let value: Value = serde_json::from_str(json)?;
        match value {
            Value::Object(mut root) => match root.remove("complainants") {
                Some(Value::Object(members)) => Ok(members.into_iter().map(|(k, _)| k).collect()),
                Some(Value::Array(items)) => Self::collect_names(items),
                _ => Err(TrendError::MissingField("complainants".to_string())),
            },
            Value::Array(items) => Self::collect_names(items),
            _ => Err(TrendError::ParseError(
                "members payload must be a JSON object or array".to_string(),
            )),
        }
    }

    /// Validate a batch of records, returning only the ones with defects
    pub fn validate_records(records: &[Record], fields: &FieldNames) -> Vec<RecordValidation> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| RecordValidation {
                index,
                record_id: record.get_str(&fields.id).map(str::to_string),
                errors: validate_record(record, fields),
            })
            .filter(|v| !v.errors.is_empty())
            .collect()
    }

    fn collect_records(items: impl IntoIterator<Item = Value>) -> Result<Vec<Record>, TrendError> {
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(Record::new(map)),
                _ => Err(TrendError::ParseError(format!(
                    "complaint at position {index} is not a JSON object"
                ))),
            })
            .collect()
    }

    fn collect_names(items: Vec<Value>) -> Result<Vec<String>, TrendError> {
        items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(name),
                other => Err(TrendError::ParseError(format!(
                    "participant name must be a string, got {other}"
                ))),
            })
            .collect()
    }
}
