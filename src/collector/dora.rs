//! Per-repository DORA metrics
//!
//! Lead time and MTTR are taken from the flow and issue extractors; only the
//! release listing is specific to this block.

use super::{WINDOW_90D, note_failure};
use crate::aggregate::dora::{
    change_failure_rate_band, deployment_frequency_band, lead_time_band, mttr_band,
};
use crate::collector::types::DoraMetrics;
use crate::github::pagination::PageSet;
use crate::github::records::Release;
use crate::stats::round2_opt;
use chrono::{DateTime, Duration, Utc};

pub const CFR_METHOD: &str = "bug_issues_per_release";

/// Months spanned by the release window
const WINDOW_MONTHS: f64 = 3.0;

pub struct DoraInputs<'a> {
    pub releases: &'a PageSet<Release>,
    pub lead_time_hours: Option<f64>,
    pub mttr_hours: Option<f64>,
    pub bugs_created_90d: Option<u64>,
}

/// Non-draft releases published within the 90-day window
pub fn releases_in_window(releases: &[Release], now: DateTime<Utc>) -> u64 {
    let window_start = now - Duration::days(WINDOW_90D);
    releases
        .iter()
        .filter(|r| !r.draft)
        .filter(|r| r.released_at().is_some_and(|at| at >= window_start && at <= now))
        .count() as u64
}

/// Bug issues per release as a percentage, capped at 100
pub fn change_failure_rate(bugs: u64, releases: u64) -> Option<f64> {
    (releases > 0).then(|| (bugs as f64 / releases as f64 * 100.0).min(100.0))
}

pub fn extract_dora_metrics(inputs: &DoraInputs<'_>, now: DateTime<Utc>) -> DoraMetrics {
    let mut errors = Vec::new();
    note_failure(
        &mut errors,
        "dora.deployment_frequency",
        &inputs.releases.response,
    );

    let releases_90d = inputs
        .releases
        .items()
        .map(|releases| releases_in_window(releases, now));
    let deployment_frequency = round2_opt(releases_90d.map(|n| n as f64 / WINDOW_MONTHS));
    let cfr = match (inputs.bugs_created_90d, releases_90d) {
        (Some(bugs), Some(releases)) => round2_opt(change_failure_rate(bugs, releases)),
        _ => None,
    };

    DoraMetrics {
        releases_90d,
        deployment_frequency,
        deployment_frequency_category: deployment_frequency.map(deployment_frequency_band),
        lead_time_hours: inputs.lead_time_hours,
        lead_time_category: inputs.lead_time_hours.map(lead_time_band),
        mttr_hours: inputs.mttr_hours,
        mttr_category: inputs.mttr_hours.map(mttr_band),
        change_failure_rate: cfr,
        change_failure_rate_category: cfr.map(change_failure_rate_band),
        change_failure_rate_method: CFR_METHOD.to_string(),
        available_releases: inputs.releases.response.is_success(),
        releases_truncated: inputs.releases.truncated,
        errors,
    }
}
