//! GitHub Actions adoption, reliability and duration

use super::{WINDOW_30D, note_failure};
use crate::collector::types::CiMetrics;
use crate::github::pagination::PageSet;
use crate::github::records::{Workflow, WorkflowRun};
use crate::stats::{mean, percentage, round2_opt};
use chrono::{DateTime, Duration, Utc};

const FAILED_CONCLUSIONS: [&str; 3] = ["failure", "timed_out", "startup_failure"];

/// Fetched inputs of the CI extractor
pub struct CiInputs {
    pub workflows: PageSet<Workflow>,
    /// `None` when runs were not queried because no workflow exists
    pub runs: Option<PageSet<WorkflowRun>>,
}

fn is_completed(run: &WorkflowRun) -> bool {
    run.status.as_deref() == Some("completed") && run.conclusion.is_some()
}

/// `max_duration_samples` bounds how many recent completed runs feed the
/// duration mean.
pub fn extract_ci_metrics(
    inputs: &CiInputs,
    now: DateTime<Utc>,
    max_duration_samples: usize,
) -> CiMetrics {
    let mut errors = Vec::new();
    note_failure(&mut errors, "ci.has_ci", &inputs.workflows.response);

    let mut metrics = CiMetrics {
        has_ci: None,
        workflows: None,
        runs_30d: None,
        success_rate: None,
        failure_rate: None,
        duration_mins: None,
        available: false,
        truncated: inputs.workflows.truncated,
        errors: Vec::new(),
    };

    let Some(workflows) = inputs.workflows.items() else {
        metrics.errors = errors;
        return metrics;
    };
    metrics.workflows = Some(workflows.len() as u64);
    metrics.has_ci = Some(!workflows.is_empty());

    if workflows.is_empty() {
        metrics.available = true;
        metrics.errors = errors;
        return metrics;
    }

    let Some(runs) = inputs.runs.as_ref() else {
        metrics.available = true;
        metrics.errors = errors;
        return metrics;
    };
    note_failure(&mut errors, "ci.runs_30d", &runs.response);
    metrics.truncated |= runs.truncated;
    metrics.available = runs.response.is_success();

    if let Some(all_runs) = runs.items() {
        let window_start = now - Duration::days(WINDOW_30D);
        let in_window: Vec<&WorkflowRun> = all_runs
            .iter()
            .filter(|run| run.created_at >= window_start)
            .collect();
        let completed: Vec<&WorkflowRun> =
            in_window.iter().copied().filter(|r| is_completed(r)).collect();

        let succeeded = completed
            .iter()
            .filter(|r| r.conclusion.as_deref() == Some("success"))
            .count() as u64;
        let failed = completed
            .iter()
            .filter(|r| {
                r.conclusion
                    .as_deref()
                    .is_some_and(|c| FAILED_CONCLUSIONS.contains(&c))
            })
            .count() as u64;

        let durations: Vec<f64> = completed
            .iter()
            .filter_map(|run| {
                let started = run.run_started_at?;
                let finished = run.updated_at?;
                Some((finished - started).num_seconds().max(0) as f64 / 60.0)
            })
            .take(max_duration_samples)
            .collect();

        metrics.runs_30d = Some(in_window.len() as u64);
        metrics.success_rate = round2_opt(percentage(succeeded, completed.len() as u64));
        metrics.failure_rate = round2_opt(percentage(failed, completed.len() as u64));
        metrics.duration_mins = round2_opt(mean(&durations));
    }

    metrics.errors = errors;
    metrics
}
