//! Issue health: backlog, resolution time, bug and security labels

use super::{WINDOW_30D, WINDOW_90D, note_failure};
use crate::collector::types::IssueMetrics;
use crate::github::pagination::PageSet;
use crate::github::records::Issue;
use crate::stats::{hours_between, mean, round2_opt};
use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

/// Open issues untouched for this long count as stale
const STALE_ISSUE_DAYS: i64 = 60;

lazy_static! {
    static ref BUG_RE: Result<Regex, regex::Error> = Regex::new(r"(?i)\bbug\b");
    static ref CRITICAL_RE: Result<Regex, regex::Error> = Regex::new(r"(?i)\bcritical\b");
    static ref SECURITY_RE: Result<Regex, regex::Error> = Regex::new(r"(?i)\bsecurity\b");
}

/// Fetched inputs of the issue extractor
pub struct IssueInputs {
    /// `state=open`
    pub open: PageSet<Issue>,
    /// `state=all` updated within the last 90 days
    pub recent: PageSet<Issue>,
}

fn has_label(issue: &Issue, matcher: &Result<Regex, regex::Error>) -> bool {
    match matcher.as_ref() {
        Ok(re) => issue.labels.iter().any(|label| re.is_match(&label.name)),
        Err(e) => {
            warn!("Failed to compile label pattern: {e}");
            false
        }
    }
}

/// Whether any label of `issue` names a bug
pub fn is_bug(issue: &Issue) -> bool {
    has_label(issue, &BUG_RE)
}

pub fn extract_issue_metrics(inputs: &IssueInputs, now: DateTime<Utc>) -> IssueMetrics {
    let mut errors = Vec::new();
    note_failure(&mut errors, "issues.open", &inputs.open.response);
    note_failure(&mut errors, "issues.closed_30d", &inputs.recent.response);

    let open: Option<Vec<&Issue>> = inputs
        .open
        .items()
        .map(|all| all.iter().filter(|i| !i.is_pull_request()).collect());
    let recent: Option<Vec<&Issue>> = inputs
        .recent
        .items()
        .map(|all| all.iter().filter(|i| !i.is_pull_request()).collect());

    let count = |issues: &Option<Vec<&Issue>>, pred: &dyn Fn(&Issue) -> bool| {
        issues
            .as_ref()
            .map(|list| list.iter().filter(|i| pred(i)).count() as u64)
    };

    let stale_cutoff = now - Duration::days(STALE_ISSUE_DAYS);
    let window_30d = now - Duration::days(WINDOW_30D);
    let window_90d = now - Duration::days(WINDOW_90D);

    let closed_in_window: Option<Vec<&Issue>> = recent.as_ref().map(|list| {
        list.iter()
            .copied()
            .filter(|i| i.closed_at.is_some_and(|at| at >= window_30d && at <= now))
            .collect()
    });
    let resolution_hours: Vec<f64> = closed_in_window
        .iter()
        .flatten()
        .filter_map(|i| i.closed_at.map(|at| hours_between(i.created_at, at).max(0.0)))
        .collect();

    IssueMetrics {
        open: open.as_ref().map(|list| list.len() as u64),
        closed_30d: closed_in_window.as_ref().map(|list| list.len() as u64),
        mttr_hours: round2_opt(mean(&resolution_hours)),
        bugs_open: count(&open, &is_bug),
        bugs_created_90d: count(&recent, &|i| i.created_at >= window_90d && is_bug(i)),
        critical: count(&open, &|i| has_label(i, &CRITICAL_RE)),
        security: count(&open, &|i| has_label(i, &SECURITY_RE)),
        stale: count(&open, &|i| i.updated_at.unwrap_or(i.created_at) < stale_cutoff),
        available: inputs.open.response.is_success() && inputs.recent.response.is_success(),
        truncated: inputs.open.truncated || inputs.recent.truncated,
        errors,
    }
}
