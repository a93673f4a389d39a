//! Error types for Outcome Trend

use thiserror::Error;

/// Errors that can occur while building a trend series
#[derive(Debug, Error)]
pub enum TrendError {
    #[error("Failed to parse complaints payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid sort pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
