//! Series encoding
//!
//! Wraps derived points in a [`TrendSeries`] stamped with producer metadata and
//! the computation time, ready for the rendering layer.

use crate::error::TrendError;
use crate::types::{DerivedPoint, SeriesProducer, TrendSeries};
use crate::{PRODUCER_NAME, TREND_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Encoder for chart-ready series payloads
pub struct SeriesEncoder {
    instance_id: String,
}

impl Default for SeriesEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode derived points into a series
    pub fn encode(&self, points: Vec<DerivedPoint>, window_length: usize) -> TrendSeries {
        TrendSeries {
            producer: SeriesProducer {
                name: PRODUCER_NAME.to_string(),
                version: TREND_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            window_length,
            first_date: points.first().map(|p| p.point.date),
            last_date: points.last().map(|p| p.point.date),
            points,
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        points: Vec<DerivedPoint>,
        window_length: usize,
    ) -> Result<String, TrendError> {
        let series = self.encode(points, window_length);
        serde_json::to_string_pretty(&series).map_err(TrendError::JsonError)
    }
}
