//! Pull-request flow metrics: lead time, review time, cycle time, throughput, WIP

use super::{WINDOW_30D, note_failure};
use crate::collector::types::PullRequestMetrics;
use crate::github::error::FieldError;
use crate::github::pagination::PageSet;
use crate::github::records::{PullRequest, Review};
use crate::stats::{hours_between, mean, percentage, round2_opt};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Open pull requests untouched for this long count as stale
const STALE_PR_DAYS: i64 = 14;

/// Fetched inputs of the flow extractor
pub struct PullRequestInputs {
    pub open: PageSet<PullRequest>,
    pub closed: PageSet<PullRequest>,
    /// Review listings of the sampled merged pull requests, keyed by number
    pub reviews: Vec<(u64, PageSet<Review>)>,
}

/// Numbers of the most recently merged pull requests in the 30-day window,
/// at most `cap` of them. These are the ones whose reviews get fetched.
pub fn review_sample(closed: &[PullRequest], now: DateTime<Utc>, cap: usize) -> Vec<u64> {
    let mut merged = merged_in_window(closed, now);
    merged.sort_by(|a, b| b.merged_at.cmp(&a.merged_at));
    merged.into_iter().take(cap).map(|pr| pr.number).collect()
}

fn merged_in_window(closed: &[PullRequest], now: DateTime<Utc>) -> Vec<&PullRequest> {
    let window_start = now - Duration::days(WINDOW_30D);
    closed
        .iter()
        .filter(|pr| pr.merged_at.is_some_and(|at| at >= window_start && at <= now))
        .collect()
}

pub fn extract_pull_request_metrics(
    inputs: &PullRequestInputs,
    now: DateTime<Utc>,
) -> PullRequestMetrics {
    let mut errors = Vec::new();
    note_failure(&mut errors, "pr.open", &inputs.open.response);
    note_failure(&mut errors, "pr.merged_30d", &inputs.closed.response);

    let stale_cutoff = now - Duration::days(STALE_PR_DAYS);
    let (open, stale) = match inputs.open.items() {
        Some(open) => (
            Some(open.len() as u64),
            Some(
                open.iter()
                    .filter(|pr| pr.updated_at.unwrap_or(pr.created_at) < stale_cutoff)
                    .count() as u64,
            ),
        ),
        None => (None, None),
    };

    let window_start = now - Duration::days(WINDOW_30D);
    let closed = inputs.closed.items();
    let merged = closed.map(|prs| merged_in_window(prs, now));
    let closed_unmerged = closed.map(|prs| {
        prs.iter()
            .filter(|pr| {
                pr.merged_at.is_none() && pr.closed_at.is_some_and(|at| at >= window_start)
            })
            .count() as u64
    });

    let lead_samples: Vec<f64> = merged
        .iter()
        .flatten()
        .filter_map(|pr| pr.merged_at.map(|at| hours_between(pr.created_at, at).max(0.0)))
        .collect();
    let lead_time_hours = mean(&lead_samples);

    let merged_count = merged.as_ref().map(|m| m.len() as u64);
    let merge_rate = match (merged_count, closed_unmerged) {
        (Some(m), Some(u)) if m > 0 => percentage(m, m + u),
        _ => None,
    };

    // First review per sampled PR
    let by_number: HashMap<u64, &PullRequest> = merged
        .iter()
        .flatten()
        .map(|pr| (pr.number, *pr))
        .collect();
    let mut review_samples = Vec::new();
    let mut cycle_samples = Vec::new();
    let mut failed_lookups = Vec::new();

    for (number, reviews) in &inputs.reviews {
        let Some(listing) = reviews.items() else {
            if let Some(reason) = reviews.response.failure_reason() {
                failed_lookups.push(format!("#{number}: {reason}"));
            }
            continue;
        };
        let first_review = listing.iter().filter_map(|r| r.submitted_at).min();
        let (Some(first_review), Some(pr)) = (first_review, by_number.get(number)) else {
            continue;
        };
        review_samples.push(hours_between(pr.created_at, first_review).max(0.0));
        if let Some(merged_at) = pr.merged_at {
            cycle_samples.push(hours_between(first_review, merged_at).max(0.0));
        }
    }

    if !failed_lookups.is_empty() {
        errors.push(FieldError::new(
            "pr.review_time_hours",
            format!(
                "{} of {} review lookups failed: {}",
                failed_lookups.len(),
                inputs.reviews.len(),
                failed_lookups.join("; ")
            ),
        ));
    }

    PullRequestMetrics {
        open,
        merged_30d: merged_count,
        closed_unmerged_30d: closed_unmerged,
        stale,
        lead_time_hours: round2_opt(lead_time_hours),
        review_time_hours: round2_opt(mean(&review_samples)),
        cycle_time_hours: round2_opt(mean(&cycle_samples)),
        merge_rate: round2_opt(merge_rate),
        review_sample_size: inputs.reviews.len() as u64,
        available: inputs.open.response.is_success() && inputs.closed.response.is_success(),
        truncated: inputs.open.truncated || inputs.closed.truncated,
        errors,
    }
}
