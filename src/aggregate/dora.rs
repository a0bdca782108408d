//! DORA performance bands and the org-level DORA rollup

use crate::aggregate::types::{DoraSummary, MetricValue};
use crate::collector::types::{DoraBand, RepositorySnapshot};
use crate::stats::{round2_opt, safe_average};

/// Stated on every dashboard: the failure rate is derived from issues, not
/// from deployment rollbacks or incidents.
pub const CFR_CAVEAT: &str = "Change failure rate is a proxy: bug issues created per release \
over the last 90 days. It is not correlated with deployments or incidents.";

/// Releases per month: Elite ≥8, High ≥4, Medium ≥1
pub fn deployment_frequency_band(per_month: f64) -> DoraBand {
    if per_month >= 8.0 {
        DoraBand::Elite
    } else if per_month >= 4.0 {
        DoraBand::High
    } else if per_month >= 1.0 {
        DoraBand::Medium
    } else {
        DoraBand::Low
    }
}

/// Hours: Elite <24, High <168, Medium <720
pub fn lead_time_band(hours: f64) -> DoraBand {
    if hours < 24.0 {
        DoraBand::Elite
    } else if hours < 168.0 {
        DoraBand::High
    } else if hours < 720.0 {
        DoraBand::Medium
    } else {
        DoraBand::Low
    }
}

/// Hours: Elite <1, High <24, Medium <168
pub fn mttr_band(hours: f64) -> DoraBand {
    if hours < 1.0 {
        DoraBand::Elite
    } else if hours < 24.0 {
        DoraBand::High
    } else if hours < 168.0 {
        DoraBand::Medium
    } else {
        DoraBand::Low
    }
}

/// Percent: Elite <5, High <15, Medium <30
pub fn change_failure_rate_band(percent: f64) -> DoraBand {
    if percent < 5.0 {
        DoraBand::Elite
    } else if percent < 15.0 {
        DoraBand::High
    } else if percent < 30.0 {
        DoraBand::Medium
    } else {
        DoraBand::Low
    }
}

/// Mean band score over the present components. `None` when all are absent.
pub fn overall_band(components: &[Option<DoraBand>]) -> Option<DoraBand> {
    let score = safe_average(components.iter().map(|band| band.map(DoraBand::score)))?;
    Some(if score >= 3.5 {
        DoraBand::Elite
    } else if score >= 2.5 {
        DoraBand::High
    } else if score >= 1.5 {
        DoraBand::Medium
    } else {
        DoraBand::Low
    })
}

fn rollup(
    repos: &[&RepositorySnapshot],
    unit: &str,
    value_of: impl Fn(&RepositorySnapshot) -> Option<f64>,
    band: fn(f64) -> DoraBand,
) -> MetricValue {
    let values: Vec<Option<f64>> = repos.iter().map(|r| value_of(r)).collect();
    // Band the exact mean; rounding first can push it across a threshold
    let mean = safe_average(values.iter().copied());
    MetricValue {
        value: round2_opt(mean),
        category: mean.map(band),
        unit: unit.to_string(),
        contributing_repos: values.iter().flatten().count() as u64,
    }
}

/// Roll the per-repository DORA values into org averages and band them.
pub fn summarize(repos: &[&RepositorySnapshot]) -> DoraSummary {
    let deployment_frequency = rollup(
        repos,
        "releases/month",
        |r| r.dora.deployment_frequency,
        deployment_frequency_band,
    );
    let lead_time = rollup(repos, "hours", |r| r.dora.lead_time_hours, lead_time_band);
    let mttr = rollup(repos, "hours", |r| r.dora.mttr_hours, mttr_band);
    let change_failure_rate = rollup(
        repos,
        "percent",
        |r| r.dora.change_failure_rate,
        change_failure_rate_band,
    );

    let overall = overall_band(&[
        deployment_frequency.category,
        lead_time.category,
        mttr.category,
        change_failure_rate.category,
    ]);

    DoraSummary {
        deployment_frequency,
        lead_time,
        mttr,
        change_failure_rate,
        overall,
        caveat: CFR_CAVEAT.to_string(),
    }
}
