//! Success ratio derivation

use crate::types::{AggregatePoint, DerivedPoint};

/// Attach `wins / (wins + losses)` to a point.
///
/// Draws are not part of the denominator. A zero denominator yields 0.
pub fn derive_percent(point: AggregatePoint) -> DerivedPoint {
    let wins = point.counts_avg.wins;
    let decided = wins + point.counts_avg.losses;
    let success_ratio = if decided > 0.0 {
        (wins / decided).clamp(0.0, 1.0)
    } else {
        0.0
    };

    DerivedPoint {
        point,
        success_ratio,
    }
}

/// Derive every point of a rolling series
pub fn derive_series(points: Vec<AggregatePoint>) -> Vec<DerivedPoint> {
    points.into_iter().map(derive_percent).collect()
}
