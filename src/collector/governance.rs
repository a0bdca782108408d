//! Health score, security score, risk classification and activity status
//!
//! Scores are additive checklists capped at 100. Absent data never earns
//! points.

use crate::collector::types::{
    ActivityStatus, CiMetrics, CommitMetrics, GovernanceMetrics, IssueMetrics,
    PullRequestMetrics, RiskAssessment, RiskLevel, SecurityMetrics,
};
use chrono::{DateTime, Utc};

const ACTIVE_DAYS: i64 = 30;
const STALE_DAYS: i64 = 180;

/// Everything the governance assessment reads for one repository
pub struct GovernanceInputs<'a> {
    pub has_description: bool,
    pub is_archived: bool,
    pub license: Option<&'a str>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pr: &'a PullRequestMetrics,
    pub issues: &'a IssueMetrics,
    pub ci: &'a CiMetrics,
    pub security: &'a SecurityMetrics,
    pub commits: &'a CommitMetrics,
}

pub fn health_score(inputs: &GovernanceInputs<'_>) -> u32 {
    let checks = [
        (inputs.has_description, 10),
        (!inputs.is_archived, 10),
        (inputs.ci.has_ci == Some(true), 15),
        (inputs.ci.success_rate.is_some_and(|rate| rate >= 80.0), 15),
        (inputs.security.branch_protection, 15),
        (inputs.pr.lead_time_hours.is_some_and(|h| h < 168.0), 10),
        (inputs.issues.stale.is_some_and(|n| n <= 5), 10),
        (inputs.commits.count_30d.is_some_and(|n| n > 0), 15),
    ];
    score(&checks)
}

pub fn security_score(security: &SecurityMetrics, license: Option<&str>) -> u32 {
    let checks = [
        (security.branch_protection, 20),
        (security.dependabot, 20),
        (security.secret_scanning, 15),
        (security.code_scanning, 15),
        (security.security_policy, 10),
        (license.is_some(), 10),
        (security.total_vulns == Some(0), 10),
    ];
    score(&checks)
}

fn score(checks: &[(bool, u32)]) -> u32 {
    checks
        .iter()
        .filter(|(passed, _)| *passed)
        .map(|(_, points)| points)
        .sum::<u32>()
        .min(100)
}

/// Level chain plus a weighted 0-100 score with the reasons behind it
pub fn classify_risk(security: &SecurityMetrics) -> RiskAssessment {
    let critical = security.critical.unwrap_or(0);
    let high = security.high.unwrap_or(0);
    let medium = security.medium.unwrap_or(0);
    let low = security.low.unwrap_or(0);
    let secrets = security.secrets.unwrap_or(0);

    let level = if critical > 0 || secrets > 0 || !security.gate_pass {
        RiskLevel::Critical
    } else if high > 0 {
        RiskLevel::High
    } else if medium > 0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let mut factors = Vec::new();
    if critical > 0 {
        factors.push(format!("{critical} critical vulnerabilities"));
    }
    if secrets > 0 {
        factors.push(format!("{secrets} exposed secrets"));
    }
    if !security.gate_pass {
        factors.push("security gate failed".to_string());
    }
    if high > 0 {
        factors.push(format!("{high} high vulnerabilities"));
    }
    if medium > 0 {
        factors.push(format!("{medium} medium vulnerabilities"));
    }
    if low > 0 {
        factors.push(format!("{low} low vulnerabilities"));
    }
    if !security.branch_protection {
        factors.push("no branch protection".to_string());
    }
    if !security.available_dependabot {
        factors.push("dependency alerts unavailable".to_string());
    }

    let weighted = 25 * critical
        + 10 * high
        + 3 * medium
        + low
        + 20 * secrets
        + if security.branch_protection { 0 } else { 10 };

    RiskAssessment {
        level,
        score: weighted.min(100) as u32,
        factors,
    }
}

/// Archived first, then by days since the last update
pub fn activity_status(
    is_archived: bool,
    updated_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (ActivityStatus, Option<i64>) {
    let days = updated_at.map(|at| (now - at).num_days().max(0));
    let status = if is_archived {
        ActivityStatus::Archived
    } else {
        match days {
            Some(d) if d < ACTIVE_DAYS => ActivityStatus::Active,
            Some(d) if d <= STALE_DAYS => ActivityStatus::Stale,
            _ => ActivityStatus::Inactive,
        }
    };
    (status, days)
}

pub fn assess(inputs: &GovernanceInputs<'_>, now: DateTime<Utc>) -> GovernanceMetrics {
    let (activity_status, days_since_update) =
        activity_status(inputs.is_archived, inputs.updated_at, now);
    GovernanceMetrics {
        health_score: health_score(inputs),
        security_score: security_score(inputs.security, inputs.license),
        risk: classify_risk(inputs.security),
        activity_status,
        days_since_update,
    }
}
