//! Organization dashboard types

use crate::collector::types::{ActivityStatus, DoraBand, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One banded org-level DORA value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: Option<f64>,
    pub category: Option<DoraBand>,
    pub unit: String,
    /// Repositories whose value was non-null
    pub contributing_repos: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoraSummary {
    pub deployment_frequency: MetricValue,
    pub lead_time: MetricValue,
    pub mttr: MetricValue,
    pub change_failure_rate: MetricValue,
    pub overall: Option<DoraBand>,
    pub caveat: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub lead_time_avg: Option<f64>,
    pub review_time_avg: Option<f64>,
    pub cycle_time_avg: Option<f64>,
    pub merge_rate_avg: Option<f64>,
    pub total_wip: u64,
    pub total_throughput: u64,
    pub stale_prs: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CiSummary {
    /// Percent of repositories with a known CI status that have workflows
    pub adoption: Option<f64>,
    pub success_rate: Option<f64>,
    pub failure_rate: Option<f64>,
    pub avg_duration: Option<f64>,
    pub total_runs: u64,
}

/// Direction of the open-vulnerability count against the previous snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VulnTrend {
    Improving,
    Stable,
    Worsening,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecuritySummary {
    /// Sums over repositories whose alerts were readable; `None` when none were
    pub critical_vulns: Option<u64>,
    pub high_vulns: Option<u64>,
    pub medium_vulns: Option<u64>,
    pub low_vulns: Option<u64>,
    pub total_vulns: Option<u64>,
    pub secrets_exposed: Option<u64>,
    pub code_issues: Option<u64>,
    pub security_mttr_hours: Option<f64>,
    pub vuln_trend: Option<VulnTrend>,
    pub previous_total_vulns: Option<u64>,
    /// Percent of repositories with readable alerts that have none open
    pub sla_compliance: Option<f64>,
    pub gate_pass_rate: Option<f64>,
    pub branch_protection: Option<f64>,
    pub dependabot_adoption: Option<f64>,
    pub secret_scanning: Option<f64>,
    pub code_scanning: Option<f64>,
    pub security_policy: Option<f64>,
    pub license_compliance: Option<f64>,
    /// Repositories whose Dependabot alerts could not be read
    pub repos_without_alert_access: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub open_count: u64,
    pub closed_30d: u64,
    pub bug_count: u64,
    pub mttr_avg: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GovernanceSummary {
    pub total_repos: u64,
    /// Non-archived repositories feeding the rollups
    pub scanned_repos: u64,
    pub archived_repos: u64,
    pub forked_repos: u64,
    pub scan_coverage: Option<f64>,
    pub risk_critical: u64,
    pub risk_high: u64,
    pub risk_medium: u64,
    pub risk_low: u64,
    pub activity_active: u64,
    pub activity_stale: u64,
    pub activity_inactive: u64,
    pub activity_archived: u64,
    pub health_score_avg: Option<f64>,
    pub security_score_avg: Option<f64>,
    pub security_score_min: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorRank {
    pub login: String,
    pub commits: u64,
    pub repo_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCount {
    pub language: String,
    pub repo_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseCount {
    /// SPDX identifier, `"None"` for repositories without a detected license
    pub license: String,
    pub repo_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub repo_count: u64,
}

/// Org-wide sums that are not per-category rollups
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgTotals {
    pub total_stars: u64,
    pub total_forks: u64,
    /// Distinct logins across the per-repository top contributor lists
    pub unique_contributors: u64,
    /// Logins that appear in more than one repository's list
    pub multi_repo_contributors: u64,
}

/// One entry of a leaderboard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRepo {
    pub name: String,
    pub url: String,
    pub value: u64,
    pub language: Option<String>,
    pub description: Option<String>,
}

/// Repository leaderboards. Stars and forks rank every repository; the
/// activity boards rank non-archived ones with a known value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopRepos {
    pub by_stars: Vec<RankedRepo>,
    pub by_forks: Vec<RankedRepo>,
    pub by_commits_30d: Vec<RankedRepo>,
    pub by_open_issues: Vec<RankedRepo>,
}

/// One line of the per-repository table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepoRow {
    pub name: String,
    pub url: String,
    pub language: Option<String>,
    pub is_archived: bool,
    pub activity_status: ActivityStatus,
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    pub health_score: u32,
    pub security_score: u32,
    pub total_vulns: Option<u64>,
    pub gate_pass: bool,
    pub deployment_frequency: Option<f64>,
    pub lead_time_hours: Option<f64>,
    pub ci_success_rate: Option<f64>,
}

/// The org-wide rollup handed to renderers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatedDashboard {
    pub org_name: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: String,
    pub repo_count: u64,
    pub scanned_repos: u64,
    pub dora: DoraSummary,
    pub flow: FlowSummary,
    pub ci: CiSummary,
    pub security: SecuritySummary,
    pub issues: IssueSummary,
    pub governance: GovernanceSummary,
    pub totals: OrgTotals,
    pub contributors: Vec<ContributorRank>,
    pub languages: Vec<LanguageCount>,
    pub licenses: Vec<LicenseCount>,
    pub topics: Vec<TopicCount>,
    pub top_repos: TopRepos,
    pub repos: Vec<RepoRow>,
}
