//! Security posture: dependency alerts, secret and code scanning, branch
//! protection, security policy

use super::{WINDOW_30D, note_failure};
use crate::collector::types::SecurityMetrics;
use crate::github::error::{ApiResponse, FieldError};
use crate::github::pagination::PageSet;
use crate::github::records::{CodeScanningAlert, DependabotAlert, SecretScanningAlert};
use crate::stats::{hours_between, mean, round2_opt};
use chrono::{DateTime, Duration, Utc};

/// Locations probed for a security policy, in order
pub const SECURITY_POLICY_PATHS: [&str; 3] =
    ["SECURITY.md", ".github/SECURITY.md", "docs/SECURITY.md"];

/// Fetched inputs of the security extractor
pub struct SecurityInputs {
    /// All Dependabot alerts (`state=all`)
    pub dependabot: PageSet<DependabotAlert>,
    /// Open secret-scanning alerts
    pub secret_scanning: PageSet<SecretScanningAlert>,
    /// Open code-scanning alerts
    pub code_scanning: PageSet<CodeScanningAlert>,
    pub branch_protection: ApiResponse<bool>,
    /// Path of the first policy file found
    pub security_policy: ApiResponse<Option<String>>,
}

#[derive(Default)]
struct SeverityCounts {
    critical: u64,
    high: u64,
    medium: u64,
    low: u64,
}

impl SeverityCounts {
    fn tally<'a>(alerts: impl Iterator<Item = &'a DependabotAlert>) -> Self {
        let mut counts = Self::default();
        for alert in alerts {
            match alert.severity().as_deref() {
                Some("critical") => counts.critical += 1,
                Some("high") => counts.high += 1,
                Some("medium") | Some("moderate") => counts.medium += 1,
                Some("low") => counts.low += 1,
                _ => {}
            }
        }
        counts
    }

    fn total(&self) -> u64 {
        self.critical + self.high + self.medium + self.low
    }
}

/// Mean hours from creation to resolution over alerts resolved in the window
fn resolution_mttr(alerts: &[DependabotAlert], now: DateTime<Utc>) -> Option<f64> {
    let window_start = now - Duration::days(WINDOW_30D);
    let samples: Vec<f64> = alerts
        .iter()
        .filter_map(|alert| {
            let resolved = alert.resolved_at()?;
            let created = alert.created_at?;
            (resolved >= window_start && resolved <= now)
                .then(|| hours_between(created, resolved).max(0.0))
        })
        .collect();
    mean(&samples)
}

pub fn extract_security_metrics(inputs: &SecurityInputs, now: DateTime<Utc>) -> SecurityMetrics {
    let mut errors = Vec::new();
    note_failure(&mut errors, "security.dependabot", &inputs.dependabot.response);
    note_failure(
        &mut errors,
        "security.secret_scanning",
        &inputs.secret_scanning.response,
    );
    note_failure(
        &mut errors,
        "security.code_scanning",
        &inputs.code_scanning.response,
    );
    if let Some(reason) = inputs.branch_protection.failure_reason() {
        errors.push(FieldError::new("security.branch_protection", reason));
    }
    if let Some(reason) = inputs.security_policy.failure_reason() {
        errors.push(FieldError::new("security.security_policy", reason));
    }

    let dependabot = inputs.dependabot.items();
    let counts = dependabot.map(|alerts| {
        SeverityCounts::tally(alerts.iter().filter(|a| a.state == "open"))
    });
    let security_mttr_hours = dependabot.and_then(|alerts| resolution_mttr(alerts, now));

    let secrets = inputs
        .secret_scanning
        .items()
        .map(|alerts| alerts.iter().filter(|a| a.state == "open").count() as u64);
    let code_open: Option<Vec<&CodeScanningAlert>> = inputs
        .code_scanning
        .items()
        .map(|alerts| alerts.iter().filter(|a| a.state == "open").collect());
    let code_critical = code_open
        .as_ref()
        .is_some_and(|alerts| alerts.iter().any(|a| a.is_critical()));

    let critical = counts.as_ref().map(|c| c.critical);
    let gate_pass =
        critical.unwrap_or(0) == 0 && secrets.unwrap_or(0) == 0 && !code_critical;

    SecurityMetrics {
        critical,
        high: counts.as_ref().map(|c| c.high),
        medium: counts.as_ref().map(|c| c.medium),
        low: counts.as_ref().map(|c| c.low),
        total_vulns: counts.as_ref().map(SeverityCounts::total),
        secrets,
        code_alerts: code_open.as_ref().map(|alerts| alerts.len() as u64),
        security_mttr_hours: round2_opt(security_mttr_hours),
        branch_protection: inputs.branch_protection.as_success().copied().unwrap_or(false),
        dependabot: inputs.dependabot.response.is_success(),
        secret_scanning: inputs.secret_scanning.response.is_success(),
        code_scanning: inputs.code_scanning.response.is_success(),
        security_policy: inputs
            .security_policy
            .as_success()
            .is_some_and(|found| found.is_some()),
        gate_pass,
        available_dependabot: inputs.dependabot.response.is_success(),
        available_secret_scanning: inputs.secret_scanning.response.is_success(),
        available_code_scanning: inputs.code_scanning.response.is_success(),
        available_branch_protection: inputs.branch_protection.is_success(),
        dependabot_truncated: inputs.dependabot.truncated,
        secret_scanning_truncated: inputs.secret_scanning.truncated,
        code_scanning_truncated: inputs.code_scanning.truncated,
        errors,
    }
}
