//! Declared contracts of the persisted artifacts

use super::FieldRule::{self, ListOf, Object, Types};
use super::JsonType::{Array, Bool, Float, Int, Null, Str};
use super::{JsonType, Schema};

const INT: &[JsonType] = &[Int];
const INT_OR_NULL: &[JsonType] = &[Int, Null];
const NUM: &[JsonType] = &[Int, Float];
const NUM_OR_NULL: &[JsonType] = &[Int, Float, Null];
const BOOL: &[JsonType] = &[Bool];
const BOOL_OR_NULL: &[JsonType] = &[Bool, Null];
const STR: &[JsonType] = &[Str];
const STR_OR_NULL: &[JsonType] = &[Str, Null];
const LIST: &[JsonType] = &[Array];

const fn t(types: &'static [JsonType]) -> FieldRule {
    Types(types)
}

const FIELD_ERROR: Schema = &[("field", t(STR)), ("reason", t(STR))];

const DORA: Schema = &[
    ("releases_90d", t(INT_OR_NULL)),
    ("deployment_frequency", t(NUM_OR_NULL)),
    ("deployment_frequency_category", t(STR_OR_NULL)),
    ("lead_time_hours", t(NUM_OR_NULL)),
    ("lead_time_category", t(STR_OR_NULL)),
    ("mttr_hours", t(NUM_OR_NULL)),
    ("mttr_category", t(STR_OR_NULL)),
    ("change_failure_rate", t(NUM_OR_NULL)),
    ("change_failure_rate_category", t(STR_OR_NULL)),
    ("change_failure_rate_method", t(STR)),
    ("available_releases", t(BOOL)),
    ("releases_truncated", t(BOOL)),
    ("errors", ListOf(FIELD_ERROR)),
];

const PULL_REQUESTS: Schema = &[
    ("open", t(INT_OR_NULL)),
    ("merged_30d", t(INT_OR_NULL)),
    ("closed_unmerged_30d", t(INT_OR_NULL)),
    ("stale", t(INT_OR_NULL)),
    ("lead_time_hours", t(NUM_OR_NULL)),
    ("review_time_hours", t(NUM_OR_NULL)),
    ("cycle_time_hours", t(NUM_OR_NULL)),
    ("merge_rate", t(NUM_OR_NULL)),
    ("review_sample_size", t(INT)),
    ("available", t(BOOL)),
    ("truncated", t(BOOL)),
    ("errors", ListOf(FIELD_ERROR)),
];

const ISSUES: Schema = &[
    ("open", t(INT_OR_NULL)),
    ("closed_30d", t(INT_OR_NULL)),
    ("mttr_hours", t(NUM_OR_NULL)),
    ("bugs_open", t(INT_OR_NULL)),
    ("bugs_created_90d", t(INT_OR_NULL)),
    ("critical", t(INT_OR_NULL)),
    ("security", t(INT_OR_NULL)),
    ("stale", t(INT_OR_NULL)),
    ("available", t(BOOL)),
    ("truncated", t(BOOL)),
    ("errors", ListOf(FIELD_ERROR)),
];

const CI: Schema = &[
    ("has_ci", t(BOOL_OR_NULL)),
    ("workflows", t(INT_OR_NULL)),
    ("runs_30d", t(INT_OR_NULL)),
    ("success_rate", t(NUM_OR_NULL)),
    ("failure_rate", t(NUM_OR_NULL)),
    ("duration_mins", t(NUM_OR_NULL)),
    ("available", t(BOOL)),
    ("truncated", t(BOOL)),
    ("errors", ListOf(FIELD_ERROR)),
];

const SECURITY: Schema = &[
    ("critical", t(INT_OR_NULL)),
    ("high", t(INT_OR_NULL)),
    ("medium", t(INT_OR_NULL)),
    ("low", t(INT_OR_NULL)),
    ("total_vulns", t(INT_OR_NULL)),
    ("secrets", t(INT_OR_NULL)),
    ("code_alerts", t(INT_OR_NULL)),
    ("security_mttr_hours", t(NUM_OR_NULL)),
    ("branch_protection", t(BOOL)),
    ("dependabot", t(BOOL)),
    ("secret_scanning", t(BOOL)),
    ("code_scanning", t(BOOL)),
    ("security_policy", t(BOOL)),
    ("gate_pass", t(BOOL)),
    ("available_dependabot", t(BOOL)),
    ("available_secret_scanning", t(BOOL)),
    ("available_code_scanning", t(BOOL)),
    ("available_branch_protection", t(BOOL)),
    ("dependabot_truncated", t(BOOL)),
    ("secret_scanning_truncated", t(BOOL)),
    ("code_scanning_truncated", t(BOOL)),
    ("errors", ListOf(FIELD_ERROR)),
];

const CONTRIBUTOR: Schema = &[("login", t(STR)), ("commits", t(INT))];

const COMMITS: Schema = &[
    ("count_30d", t(INT_OR_NULL)),
    ("authors_30d", t(INT_OR_NULL)),
    ("top", ListOf(CONTRIBUTOR)),
    ("available", t(BOOL)),
    ("truncated", t(BOOL)),
    ("errors", ListOf(FIELD_ERROR)),
];

const RISK: Schema = &[("level", t(STR)), ("score", t(INT)), ("factors", t(LIST))];

const GOVERNANCE: Schema = &[
    ("health_score", t(INT)),
    ("security_score", t(INT)),
    ("risk", Object(RISK)),
    ("activity_status", t(STR)),
    ("days_since_update", t(INT_OR_NULL)),
];

/// `raw/<repo>.json`
pub const REPOSITORY_SNAPSHOT: Schema = &[
    ("name", t(STR)),
    ("full_name", t(STR)),
    ("url", t(STR)),
    ("description", t(STR_OR_NULL)),
    ("language", t(STR_OR_NULL)),
    ("license", t(STR_OR_NULL)),
    ("is_archived", t(BOOL)),
    ("is_fork", t(BOOL)),
    ("is_private", t(BOOL)),
    ("default_branch", t(STR)),
    ("topics", t(LIST)),
    ("created_at", t(STR_OR_NULL)),
    ("updated_at", t(STR_OR_NULL)),
    ("pushed_at", t(STR_OR_NULL)),
    ("stars", t(INT)),
    ("forks", t(INT)),
    ("collected_at", t(STR)),
    ("run_id", t(STR)),
    ("dora", Object(DORA)),
    ("pr", Object(PULL_REQUESTS)),
    ("issues", Object(ISSUES)),
    ("ci", Object(CI)),
    ("security", Object(SECURITY)),
    ("commits", Object(COMMITS)),
    ("governance", Object(GOVERNANCE)),
];

const METRIC_VALUE: Schema = &[
    ("value", t(NUM_OR_NULL)),
    ("category", t(STR_OR_NULL)),
    ("unit", t(STR)),
    ("contributing_repos", t(INT)),
];

const DORA_SUMMARY: Schema = &[
    ("deployment_frequency", Object(METRIC_VALUE)),
    ("lead_time", Object(METRIC_VALUE)),
    ("mttr", Object(METRIC_VALUE)),
    ("change_failure_rate", Object(METRIC_VALUE)),
    ("overall", t(STR_OR_NULL)),
    ("caveat", t(STR)),
];

const FLOW_SUMMARY: Schema = &[
    ("lead_time_avg", t(NUM_OR_NULL)),
    ("review_time_avg", t(NUM_OR_NULL)),
    ("cycle_time_avg", t(NUM_OR_NULL)),
    ("merge_rate_avg", t(NUM_OR_NULL)),
    ("total_wip", t(INT)),
    ("total_throughput", t(INT)),
    ("stale_prs", t(INT)),
];

const CI_SUMMARY: Schema = &[
    ("adoption", t(NUM_OR_NULL)),
    ("success_rate", t(NUM_OR_NULL)),
    ("failure_rate", t(NUM_OR_NULL)),
    ("avg_duration", t(NUM_OR_NULL)),
    ("total_runs", t(INT)),
];

const SECURITY_SUMMARY: Schema = &[
    ("critical_vulns", t(INT_OR_NULL)),
    ("high_vulns", t(INT_OR_NULL)),
    ("medium_vulns", t(INT_OR_NULL)),
    ("low_vulns", t(INT_OR_NULL)),
    ("total_vulns", t(INT_OR_NULL)),
    ("secrets_exposed", t(INT_OR_NULL)),
    ("code_issues", t(INT_OR_NULL)),
    ("security_mttr_hours", t(NUM_OR_NULL)),
    ("vuln_trend", t(STR_OR_NULL)),
    ("previous_total_vulns", t(INT_OR_NULL)),
    ("sla_compliance", t(NUM_OR_NULL)),
    ("gate_pass_rate", t(NUM_OR_NULL)),
    ("branch_protection", t(NUM_OR_NULL)),
    ("dependabot_adoption", t(NUM_OR_NULL)),
    ("secret_scanning", t(NUM_OR_NULL)),
    ("code_scanning", t(NUM_OR_NULL)),
    ("security_policy", t(NUM_OR_NULL)),
    ("license_compliance", t(NUM_OR_NULL)),
    ("repos_without_alert_access", t(INT)),
];

const ISSUE_SUMMARY: Schema = &[
    ("open_count", t(INT)),
    ("closed_30d", t(INT)),
    ("bug_count", t(INT)),
    ("mttr_avg", t(NUM_OR_NULL)),
];

const GOVERNANCE_SUMMARY: Schema = &[
    ("total_repos", t(INT)),
    ("scanned_repos", t(INT)),
    ("archived_repos", t(INT)),
    ("forked_repos", t(INT)),
    ("scan_coverage", t(NUM_OR_NULL)),
    ("risk_critical", t(INT)),
    ("risk_high", t(INT)),
    ("risk_medium", t(INT)),
    ("risk_low", t(INT)),
    ("activity_active", t(INT)),
    ("activity_stale", t(INT)),
    ("activity_inactive", t(INT)),
    ("activity_archived", t(INT)),
    ("health_score_avg", t(NUM_OR_NULL)),
    ("security_score_avg", t(NUM_OR_NULL)),
    ("security_score_min", t(INT_OR_NULL)),
];

const CONTRIBUTOR_RANK: Schema = &[
    ("login", t(STR)),
    ("commits", t(INT)),
    ("repo_count", t(INT)),
];

const LANGUAGE_COUNT: Schema = &[("language", t(STR)), ("repo_count", t(INT))];

const LICENSE_COUNT: Schema = &[("license", t(STR)), ("repo_count", t(INT))];

const TOPIC_COUNT: Schema = &[("topic", t(STR)), ("repo_count", t(INT))];

const ORG_TOTALS: Schema = &[
    ("total_stars", t(INT)),
    ("total_forks", t(INT)),
    ("unique_contributors", t(INT)),
    ("multi_repo_contributors", t(INT)),
];

const RANKED_REPO: Schema = &[
    ("name", t(STR)),
    ("url", t(STR)),
    ("value", t(INT)),
    ("language", t(STR_OR_NULL)),
    ("description", t(STR_OR_NULL)),
];

const TOP_REPOS: Schema = &[
    ("by_stars", ListOf(RANKED_REPO)),
    ("by_forks", ListOf(RANKED_REPO)),
    ("by_commits_30d", ListOf(RANKED_REPO)),
    ("by_open_issues", ListOf(RANKED_REPO)),
];

const REPO_ROW: Schema = &[
    ("name", t(STR)),
    ("url", t(STR)),
    ("language", t(STR_OR_NULL)),
    ("is_archived", t(BOOL)),
    ("activity_status", t(STR)),
    ("risk_level", t(STR)),
    ("risk_score", t(INT)),
    ("health_score", t(INT)),
    ("security_score", t(INT)),
    ("total_vulns", t(INT_OR_NULL)),
    ("gate_pass", t(BOOL)),
    ("deployment_frequency", t(NUM_OR_NULL)),
    ("lead_time_hours", t(NUM_OR_NULL)),
    ("ci_success_rate", t(NUM_OR_NULL)),
];

/// `aggregated/dashboard.json` and `history/<day>.json`
pub const AGGREGATED_DASHBOARD: Schema = &[
    ("org_name", t(STR)),
    ("generated_at", t(STR)),
    ("run_id", t(STR)),
    ("repo_count", t(INT)),
    ("scanned_repos", t(INT)),
    ("dora", Object(DORA_SUMMARY)),
    ("flow", Object(FLOW_SUMMARY)),
    ("ci", Object(CI_SUMMARY)),
    ("security", Object(SECURITY_SUMMARY)),
    ("issues", Object(ISSUE_SUMMARY)),
    ("governance", Object(GOVERNANCE_SUMMARY)),
    ("totals", Object(ORG_TOTALS)),
    ("contributors", ListOf(CONTRIBUTOR_RANK)),
    ("languages", ListOf(LANGUAGE_COUNT)),
    ("licenses", ListOf(LICENSE_COUNT)),
    ("topics", ListOf(TOPIC_COUNT)),
    ("top_repos", Object(TOP_REPOS)),
    ("repos", ListOf(REPO_ROW)),
];

const RISK_HISTOGRAM: Schema = &[
    ("critical", t(INT)),
    ("high", t(INT)),
    ("medium", t(INT)),
    ("low", t(INT)),
];

const ACTIVITY_HISTOGRAM: Schema = &[
    ("active", t(INT)),
    ("stale", t(INT)),
    ("inactive", t(INT)),
    ("archived", t(INT)),
];

const REPO_GOVERNANCE: Schema = &[
    ("name", t(STR)),
    ("risk_level", t(STR)),
    ("health_score", t(INT)),
    ("security_score", t(INT)),
    ("activity_status", t(STR)),
];

/// `org/governance.json`
pub const ORG_GOVERNANCE_SUMMARY: Schema = &[
    ("org_name", t(STR)),
    ("run_id", t(STR)),
    ("collected_at", t(STR)),
    ("repos_total", t(INT)),
    ("repos_scanned", t(INT)),
    ("repos_skipped", t(INT)),
    ("risk", Object(RISK_HISTOGRAM)),
    ("activity", Object(ACTIVITY_HISTOGRAM)),
    ("repos", ListOf(REPO_GOVERNANCE)),
];

/// `runs/<run_id>.json`
pub const RUN_METADATA: Schema = &[
    ("run_id", t(STR)),
    ("started_at", t(STR)),
    ("finished_at", t(STR)),
    ("duration_secs", t(NUM)),
    ("repos_total", t(INT)),
    ("repos_scanned", t(INT)),
    ("repos_skipped", t(INT)),
    ("repos_failed", t(INT)),
    ("requests_made", t(INT)),
    ("error_count", t(INT)),
    ("rate_limit_remaining", t(INT)),
    ("rate_limit_reset", t(STR)),
    ("stopped_early", t(BOOL)),
    ("collector_version", t(STR)),
];
