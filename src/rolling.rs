//! Rolling averages
//!
//! Trailing-window averages over contiguous day buckets. A point is emitted only
//! once a full window is available, so a series of `n` buckets with window `w`
//! yields `max(0, n - w + 1)` points. Every metric is divided by `w`.

use crate::error::TrendError;
use crate::types::{AggregatePoint, DayBucket, OutcomeAverages, OutcomeCounts};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
struct WindowSums {
    wins: u64,
    losses: u64,
    draws: u64,
    total: u64,
}

impl WindowSums {
    fn add(&mut self, counts: &OutcomeCounts, total: usize) {
        self.wins += u64::from(counts.wins);
        self.losses += u64::from(counts.losses);
        self.draws += u64::from(counts.draws);
        self.total += total as u64;
    }

    fn remove(&mut self, counts: &OutcomeCounts, total: usize) {
        self.wins -= u64::from(counts.wins);
        self.losses -= u64::from(counts.losses);
        self.draws -= u64::from(counts.draws);
        self.total -= total as u64;
    }
}

/// Compute trailing averages with a window of `window_length` buckets.
///
/// Fails with [`TrendError::InvalidParameter`] when `window_length` is 0.
pub fn rolling_average(
    buckets: &[DayBucket],
    window_length: usize,
) -> Result<Vec<AggregatePoint>, TrendError> {
    if window_length == 0 {
        return Err(TrendError::InvalidParameter(
            "window_length must be at least 1".to_string(),
        ));
    }

    let mut points = Vec::with_capacity((buckets.len() + 1).saturating_sub(window_length));
    let divisor = window_length as f64;
    let mut sums = WindowSums::default();

    for (i, bucket) in buckets.iter().enumerate() {
        sums.add(&bucket.counts, bucket.records.len());
        if i >= window_length {
            let leaving = &buckets[i - window_length];
            sums.remove(&leaving.counts, leaving.records.len());
        }
        if i + 1 >= window_length {
            points.push(AggregatePoint {
                date: bucket.date,
                counts_avg: OutcomeAverages {
                    wins: sums.wins as f64 / divisor,
                    losses: sums.losses as f64 / divisor,
                    draws: sums.draws as f64 / divisor,
                },
                total_avg: sums.total as f64 / divisor,
            });
        }
    }

    debug!(
        buckets = buckets.len(),
        window_length,
        points = points.len(),
        "computed rolling averages"
    );

    Ok(points)
}
