//! Per-repository snapshot types
//!
//! Every numeric metric is an `Option`: `None` means the contributing data was
//! empty or inaccessible, never zero.

use crate::github::error::FieldError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// DORA performance band
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DoraBand {
    Low,
    Medium,
    High,
    Elite,
}

impl DoraBand {
    /// Elite=4 … Low=1
    pub fn score(self) -> f64 {
        match self {
            DoraBand::Elite => 4.0,
            DoraBand::High => 3.0,
            DoraBand::Medium => 2.0,
            DoraBand::Low => 1.0,
        }
    }
}

impl fmt::Display for DoraBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DoraBand::Elite => "Elite",
            DoraBand::High => "High",
            DoraBand::Medium => "Medium",
            DoraBand::Low => "Low",
        };
        f.write_str(s)
    }
}

/// Per-repository risk classification, most severe first when sorted
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Critical => "Critical",
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityStatus {
    Active,
    Stale,
    Inactive,
    Archived,
}

/// Deployment-side delivery metrics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoraMetrics {
    pub releases_90d: Option<u64>,
    /// Releases per month over the last 90 days
    pub deployment_frequency: Option<f64>,
    pub deployment_frequency_category: Option<DoraBand>,
    pub lead_time_hours: Option<f64>,
    pub lead_time_category: Option<DoraBand>,
    pub mttr_hours: Option<f64>,
    pub mttr_category: Option<DoraBand>,
    /// Issue-based proxy, see `change_failure_rate_method`
    pub change_failure_rate: Option<f64>,
    pub change_failure_rate_category: Option<DoraBand>,
    pub change_failure_rate_method: String,
    pub available_releases: bool,
    pub releases_truncated: bool,
    pub errors: Vec<FieldError>,
}

/// Pull-request flow metrics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PullRequestMetrics {
    /// Work in progress
    pub open: Option<u64>,
    /// Throughput
    pub merged_30d: Option<u64>,
    pub closed_unmerged_30d: Option<u64>,
    pub stale: Option<u64>,
    pub lead_time_hours: Option<f64>,
    pub review_time_hours: Option<f64>,
    pub cycle_time_hours: Option<f64>,
    pub merge_rate: Option<f64>,
    pub review_sample_size: u64,
    pub available: bool,
    pub truncated: bool,
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IssueMetrics {
    pub open: Option<u64>,
    pub closed_30d: Option<u64>,
    pub mttr_hours: Option<f64>,
    pub bugs_open: Option<u64>,
    pub bugs_created_90d: Option<u64>,
    pub critical: Option<u64>,
    pub security: Option<u64>,
    pub stale: Option<u64>,
    pub available: bool,
    pub truncated: bool,
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CiMetrics {
    pub has_ci: Option<bool>,
    pub workflows: Option<u64>,
    pub runs_30d: Option<u64>,
    pub success_rate: Option<f64>,
    pub failure_rate: Option<f64>,
    pub duration_mins: Option<f64>,
    pub available: bool,
    pub truncated: bool,
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecurityMetrics {
    pub critical: Option<u64>,
    pub high: Option<u64>,
    pub medium: Option<u64>,
    pub low: Option<u64>,
    pub total_vulns: Option<u64>,
    pub secrets: Option<u64>,
    pub code_alerts: Option<u64>,
    pub security_mttr_hours: Option<f64>,
    pub branch_protection: bool,
    pub dependabot: bool,
    pub secret_scanning: bool,
    pub code_scanning: bool,
    pub security_policy: bool,
    pub gate_pass: bool,
    pub available_dependabot: bool,
    pub available_secret_scanning: bool,
    pub available_code_scanning: bool,
    pub available_branch_protection: bool,
    pub dependabot_truncated: bool,
    pub secret_scanning_truncated: bool,
    pub code_scanning_truncated: bool,
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorCount {
    pub login: String,
    pub commits: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitMetrics {
    pub count_30d: Option<u64>,
    pub authors_30d: Option<u64>,
    pub top: Vec<ContributorCount>,
    pub available: bool,
    pub truncated: bool,
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: u32,
    pub factors: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GovernanceMetrics {
    pub health_score: u32,
    pub security_score: u32,
    pub risk: RiskAssessment,
    pub activity_status: ActivityStatus,
    pub days_since_update: Option<i64>,
}

/// Everything collected for one repository in one run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub name: String,
    pub full_name: String,
    pub url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub license: Option<String>,
    pub is_archived: bool,
    pub is_fork: bool,
    pub is_private: bool,
    pub default_branch: String,
    pub topics: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub stars: u64,
    pub forks: u64,
    pub collected_at: DateTime<Utc>,
    pub run_id: String,
    pub dora: DoraMetrics,
    pub pr: PullRequestMetrics,
    pub issues: IssueMetrics,
    pub ci: CiMetrics,
    pub security: SecurityMetrics,
    pub commits: CommitMetrics,
    pub governance: GovernanceMetrics,
}

impl RepositorySnapshot {
    /// Non-fatal field errors across all categories
    pub fn errors(&self) -> impl Iterator<Item = &FieldError> {
        self.dora
            .errors
            .iter()
            .chain(&self.pr.errors)
            .chain(&self.issues.errors)
            .chain(&self.ci.errors)
            .chain(&self.security.errors)
            .chain(&self.commits.errors)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}
