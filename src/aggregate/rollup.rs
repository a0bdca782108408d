//! Category rollups over repository snapshots
//!
//! Averages go through [`safe_average`]; sums count only known values.
//! `repos` here are the non-archived snapshots unless a function says
//! otherwise.

use crate::aggregate::types::{
    CiSummary, ContributorRank, FlowSummary, GovernanceSummary, IssueSummary, LanguageCount,
    LicenseCount, OrgTotals, RankedRepo, RepoRow, SecuritySummary, TopRepos, TopicCount,
};
use crate::collector::types::{ActivityStatus, RepositorySnapshot, RiskLevel};
use crate::stats::{percentage, round2_opt, safe_average};
use std::collections::{BTreeMap, HashMap};

/// Org-wide contributor ranking length
pub const TOP_CONTRIBUTORS: usize = 20;
/// Topic histogram length
pub const TOP_TOPICS: usize = 30;
/// Leaderboard length
pub const TOP_REPOS: usize = 10;
const DESCRIPTION_CHARS: usize = 100;
/// License label for repositories without a detected license
pub const NO_LICENSE: &str = "None";

fn average(
    repos: &[&RepositorySnapshot],
    value_of: impl Fn(&RepositorySnapshot) -> Option<f64>,
) -> Option<f64> {
    round2_opt(safe_average(repos.iter().map(|r| value_of(r))))
}

fn total(
    repos: &[&RepositorySnapshot],
    value_of: impl Fn(&RepositorySnapshot) -> Option<u64>,
) -> u64 {
    repos.iter().filter_map(|r| value_of(r)).sum()
}

/// Sum of the known values, `None` when no repository reported one
fn known_total(
    repos: &[&RepositorySnapshot],
    value_of: impl Fn(&RepositorySnapshot) -> Option<u64>,
) -> Option<u64> {
    repos
        .iter()
        .filter_map(|r| value_of(r))
        .fold(None, |sum, v| Some(sum.unwrap_or(0) + v))
}

/// Percent of `repos` satisfying `pred`; `None` for an empty population.
fn share(repos: &[&RepositorySnapshot], pred: impl Fn(&RepositorySnapshot) -> bool) -> Option<f64> {
    let hits = repos.iter().filter(|r| pred(r)).count() as u64;
    round2_opt(percentage(hits, repos.len() as u64))
}

pub fn flow(repos: &[&RepositorySnapshot]) -> FlowSummary {
    FlowSummary {
        lead_time_avg: average(repos, |r| r.pr.lead_time_hours),
        review_time_avg: average(repos, |r| r.pr.review_time_hours),
        cycle_time_avg: average(repos, |r| r.pr.cycle_time_hours),
        merge_rate_avg: average(repos, |r| r.pr.merge_rate),
        total_wip: total(repos, |r| r.pr.open),
        total_throughput: total(repos, |r| r.pr.merged_30d),
        stale_prs: total(repos, |r| r.pr.stale),
    }
}

pub fn ci(repos: &[&RepositorySnapshot]) -> CiSummary {
    let known: Vec<&RepositorySnapshot> = repos
        .iter()
        .copied()
        .filter(|r| r.ci.has_ci.is_some())
        .collect();
    CiSummary {
        adoption: share(&known, |r| r.ci.has_ci == Some(true)),
        success_rate: average(repos, |r| r.ci.success_rate),
        failure_rate: average(repos, |r| r.ci.failure_rate),
        avg_duration: average(repos, |r| r.ci.duration_mins),
        total_runs: total(repos, |r| r.ci.runs_30d),
    }
}

/// Security rollup without the trend fields, which need the previous snapshot
pub fn security(repos: &[&RepositorySnapshot]) -> SecuritySummary {
    let readable: Vec<&RepositorySnapshot> = repos
        .iter()
        .copied()
        .filter(|r| r.security.total_vulns.is_some())
        .collect();
    SecuritySummary {
        critical_vulns: known_total(repos, |r| r.security.critical),
        high_vulns: known_total(repos, |r| r.security.high),
        medium_vulns: known_total(repos, |r| r.security.medium),
        low_vulns: known_total(repos, |r| r.security.low),
        total_vulns: known_total(repos, |r| r.security.total_vulns),
        secrets_exposed: known_total(repos, |r| r.security.secrets),
        code_issues: known_total(repos, |r| r.security.code_alerts),
        security_mttr_hours: average(repos, |r| r.security.security_mttr_hours),
        vuln_trend: None,
        previous_total_vulns: None,
        sla_compliance: share(&readable, |r| r.security.total_vulns == Some(0)),
        gate_pass_rate: share(repos, |r| r.security.gate_pass),
        branch_protection: share(repos, |r| r.security.branch_protection),
        dependabot_adoption: share(repos, |r| r.security.dependabot),
        secret_scanning: share(repos, |r| r.security.secret_scanning),
        code_scanning: share(repos, |r| r.security.code_scanning),
        security_policy: share(repos, |r| r.security.security_policy),
        license_compliance: share(repos, |r| r.license.is_some()),
        repos_without_alert_access: (repos.len() - readable.len()) as u64,
    }
}

pub fn issues(repos: &[&RepositorySnapshot]) -> IssueSummary {
    IssueSummary {
        open_count: total(repos, |r| r.issues.open),
        closed_30d: total(repos, |r| r.issues.closed_30d),
        bug_count: total(repos, |r| r.issues.bugs_open),
        mttr_avg: average(repos, |r| r.issues.mttr_hours),
    }
}

/// Governance over every snapshot, archived included
pub fn governance(all: &[RepositorySnapshot], repos_listed: u64) -> GovernanceSummary {
    let all_refs: Vec<&RepositorySnapshot> = all.iter().collect();
    let risk = |level: RiskLevel| {
        all.iter()
            .filter(|r| r.governance.risk.level == level)
            .count() as u64
    };
    let activity = |status: ActivityStatus| {
        all.iter()
            .filter(|r| r.governance.activity_status == status)
            .count() as u64
    };
    let archived = all.iter().filter(|r| r.is_archived).count() as u64;

    GovernanceSummary {
        total_repos: repos_listed,
        scanned_repos: all.len() as u64 - archived,
        archived_repos: archived,
        forked_repos: all.iter().filter(|r| r.is_fork).count() as u64,
        scan_coverage: round2_opt(percentage(all.len() as u64, repos_listed)),
        risk_critical: risk(RiskLevel::Critical),
        risk_high: risk(RiskLevel::High),
        risk_medium: risk(RiskLevel::Medium),
        risk_low: risk(RiskLevel::Low),
        activity_active: activity(ActivityStatus::Active),
        activity_stale: activity(ActivityStatus::Stale),
        activity_inactive: activity(ActivityStatus::Inactive),
        activity_archived: activity(ActivityStatus::Archived),
        health_score_avg: average(&all_refs, |r| Some(r.governance.health_score as f64)),
        security_score_avg: average(&all_refs, |r| Some(r.governance.security_score as f64)),
        security_score_min: all.iter().map(|r| r.governance.security_score).min(),
    }
}

/// Every login across the per-repository top lists, most commits first
fn merged_contributors(repos: &[&RepositorySnapshot]) -> Vec<ContributorRank> {
    let mut merged: HashMap<&str, (u64, u64)> = HashMap::new();
    for repo in repos {
        for entry in &repo.commits.top {
            let slot = merged.entry(entry.login.as_str()).or_default();
            slot.0 += entry.commits;
            slot.1 += 1;
        }
    }
    let mut ranked: Vec<ContributorRank> = merged
        .into_iter()
        .map(|(login, (commits, repo_count))| ContributorRank {
            login: login.to_string(),
            commits,
            repo_count,
        })
        .collect();
    ranked.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.login.cmp(&b.login)));
    ranked
}

/// Merge per-repository top lists into the org ranking
pub fn contributors(repos: &[&RepositorySnapshot]) -> Vec<ContributorRank> {
    let mut ranked = merged_contributors(repos);
    ranked.truncate(TOP_CONTRIBUTORS);
    ranked
}

/// Stars and forks over `all` snapshots, contributor reach over `repos`
pub fn totals(all: &[RepositorySnapshot], repos: &[&RepositorySnapshot]) -> OrgTotals {
    let contributors = merged_contributors(repos);
    OrgTotals {
        total_stars: all.iter().map(|r| r.stars).sum(),
        total_forks: all.iter().map(|r| r.forks).sum(),
        unique_contributors: contributors.len() as u64,
        multi_repo_contributors: contributors.iter().filter(|c| c.repo_count > 1).count() as u64,
    }
}

/// `(label, count)` pairs, most frequent first, ties by label
fn histogram<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<(String, u64)> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut ranked: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    // Stable sort keeps the BTreeMap's label order among ties
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Primary-language histogram, most used first
pub fn languages(repos: &[&RepositorySnapshot]) -> Vec<LanguageCount> {
    histogram(repos.iter().filter_map(|r| r.language.as_deref()))
        .into_iter()
        .map(|(language, repo_count)| LanguageCount {
            language,
            repo_count,
        })
        .collect()
}

/// License histogram over every snapshot, unlicensed repositories as `"None"`
pub fn licenses(all: &[RepositorySnapshot]) -> Vec<LicenseCount> {
    histogram(all.iter().map(|r| r.license.as_deref().unwrap_or(NO_LICENSE)))
        .into_iter()
        .map(|(license, repo_count)| LicenseCount {
            license,
            repo_count,
        })
        .collect()
}

/// Topic histogram over every snapshot, capped at [`TOP_TOPICS`]
pub fn topics(all: &[RepositorySnapshot]) -> Vec<TopicCount> {
    let labels = all.iter().flat_map(|r| r.topics.iter().map(String::as_str));
    let mut ranked: Vec<TopicCount> = histogram(labels)
        .into_iter()
        .map(|(topic, repo_count)| TopicCount { topic, repo_count })
        .collect();
    ranked.truncate(TOP_TOPICS);
    ranked
}

fn leaderboard<'a>(
    repos: impl IntoIterator<Item = &'a RepositorySnapshot>,
    value_of: impl Fn(&RepositorySnapshot) -> Option<u64>,
) -> Vec<RankedRepo> {
    let mut ranked: Vec<RankedRepo> = repos
        .into_iter()
        .filter_map(|r| {
            Some(RankedRepo {
                name: r.name.clone(),
                url: r.url.clone(),
                value: value_of(r)?,
                language: r.language.clone(),
                description: r
                    .description
                    .as_deref()
                    .map(|d| d.chars().take(DESCRIPTION_CHARS).collect()),
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(TOP_REPOS);
    ranked
}

/// Leaderboards; stars and forks include archived repositories
pub fn top_repos(all: &[RepositorySnapshot], repos: &[&RepositorySnapshot]) -> TopRepos {
    TopRepos {
        by_stars: leaderboard(all, |r| Some(r.stars)),
        by_forks: leaderboard(all, |r| Some(r.forks)),
        by_commits_30d: leaderboard(repos.iter().copied(), |r| r.commits.count_30d),
        by_open_issues: leaderboard(repos.iter().copied(), |r| r.issues.open),
    }
}

/// Table rows for every snapshot, most severe risk first, then by name
pub fn repo_rows(all: &[RepositorySnapshot]) -> Vec<RepoRow> {
    let mut rows: Vec<RepoRow> = all
        .iter()
        .map(|r| RepoRow {
            name: r.name.clone(),
            url: r.url.clone(),
            language: r.language.clone(),
            is_archived: r.is_archived,
            activity_status: r.governance.activity_status,
            risk_level: r.governance.risk.level,
            risk_score: r.governance.risk.score,
            health_score: r.governance.health_score,
            security_score: r.governance.security_score,
            total_vulns: r.security.total_vulns,
            gate_pass: r.security.gate_pass,
            deployment_frequency: r.dora.deployment_frequency,
            lead_time_hours: r.pr.lead_time_hours,
            ci_success_rate: r.ci.success_rate,
        })
        .collect();
    rows.sort_by(|a, b| a.risk_level.cmp(&b.risk_level).then_with(|| a.name.cmp(&b.name)));
    rows
}
