//! Complaints input schema
//!
//! The data source serves complaints as JSON, either keyed by complaint id or as
//! a plain list. This module turns those payloads into ordered [`Record`]s and
//! reports records the pipeline will only be able to place approximately.
//!
//! [`Record`]: crate::types::Record

mod adapter;
mod validation;

pub use adapter::*;
pub use validation::*;
