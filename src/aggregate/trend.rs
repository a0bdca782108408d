//! Period-over-period vulnerability trend

use crate::aggregate::types::{RepoRow, VulnTrend};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Sign of `current - previous`. A missing side means no trend.
pub fn vulnerability_trend(current: Option<u64>, previous: Option<u64>) -> Option<VulnTrend> {
    let (current, previous) = (current?, previous?);
    Some(match current.cmp(&previous) {
        Ordering::Less => VulnTrend::Improving,
        Ordering::Equal => VulnTrend::Stable,
        Ordering::Greater => VulnTrend::Worsening,
    })
}

/// Open-vulnerability totals `(current, previous)` over the active
/// repositories whose alerts were readable in both runs.
///
/// A repository that lost alert access, or is new, does not move the trend.
/// `None` when no repository is comparable.
pub fn comparable_totals(current: &[RepoRow], previous: &[RepoRow]) -> Option<(u64, u64)> {
    let earlier: HashMap<&str, u64> = previous
        .iter()
        .filter(|row| !row.is_archived)
        .filter_map(|row| Some((row.name.as_str(), row.total_vulns?)))
        .collect();

    current
        .iter()
        .filter(|row| !row.is_archived)
        .filter_map(|row| Some((row.total_vulns?, *earlier.get(row.name.as_str())?)))
        .fold(None, |sums, (now, then)| {
            let (a, b) = sums.unwrap_or((0, 0));
            Some((a + now, b + then))
        })
}
