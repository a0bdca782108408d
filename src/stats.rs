//! Null-aware numeric helpers shared by the extractors and the aggregator

use chrono::{DateTime, Utc};

/// Mean over the present values. `None` when nothing contributes.
///
/// ```
/// use org_metrics::stats::safe_average;
///
/// assert_eq!(safe_average([Some(10.0), None, Some(30.0)]), Some(20.0));
/// assert_eq!(safe_average::<[Option<f64>; 0]>([]), None);
/// ```
pub fn safe_average<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Mean of a sample. `None` for an empty sample.
pub fn mean(samples: &[f64]) -> Option<f64> {
    safe_average(samples.iter().copied().map(Some))
}

/// `part / whole * 100`, or `None` when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

/// Elapsed hours from `start` to `end`
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}

/// Round to two decimals, the precision of every persisted float
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round2_opt(value: Option<f64>) -> Option<f64> {
    value.map(round2)
}
