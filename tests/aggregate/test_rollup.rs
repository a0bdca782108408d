//! Tests for the org rollup over repository snapshots.

use crate::support::{
    decoded, denied, dependabot_alert, empty_fetch, hours_ago, merged_pr, now, release, snapshot,
    snapshot_from,
};
use org_metrics::aggregate::{AggregateContext, aggregate};
use org_metrics::collector::RepositorySnapshot;
use org_metrics::collector::types::{DoraBand, RiskLevel};
use serde_json::json;

fn ctx() -> AggregateContext {
    AggregateContext {
        org_name: "acme".to_string(),
        run_id: "run-1".to_string(),
        generated_at: now(),
        repos_listed: None,
    }
}

/// A releases often, B merged nothing, C carries two open criticals.
fn three_repositories() -> Vec<RepositorySnapshot> {
    let mut a = empty_fetch();
    a.releases = decoded((1..=5).map(|i| release(i * 15)).collect());
    a.pull_requests.closed = decoded(vec![
        merged_pr(1, hours_ago(40), hours_ago(10)),
        merged_pr(2, hours_ago(20), hours_ago(10)),
    ]);

    let mut b = empty_fetch();
    b.releases = denied();

    let mut c = empty_fetch();
    c.releases = denied();
    c.security.dependabot = decoded(vec![
        dependabot_alert("critical", "open"),
        dependabot_alert("critical", "open"),
    ]);

    vec![
        snapshot_from("a", &a),
        snapshot_from("b", &b),
        snapshot_from("c", &c),
    ]
}

#[test]
fn test_three_repository_dashboard() {
    let snapshots = three_repositories();
    assert_eq!(snapshots[0].dora.deployment_frequency, Some(1.67));
    assert_eq!(
        snapshots[0].dora.deployment_frequency_category,
        Some(DoraBand::Medium)
    );
    assert_eq!(snapshots[1].pr.lead_time_hours, None);
    assert_eq!(snapshots[2].governance.risk.level, RiskLevel::Critical);

    let dashboard = aggregate(&snapshots, None, &ctx());

    assert_eq!(dashboard.repo_count, 3);
    assert_eq!(dashboard.dora.deployment_frequency.value, Some(1.67));
    assert_eq!(dashboard.dora.deployment_frequency.contributing_repos, 1);
    assert_eq!(dashboard.dora.lead_time.value, Some(20.0));
    assert_eq!(dashboard.flow.total_throughput, 2);
    assert_eq!(dashboard.governance.risk_critical, 1);
    assert_eq!(dashboard.governance.risk_low, 2);
    assert_eq!(dashboard.security.critical_vulns, Some(2));
    assert_eq!(dashboard.security.vuln_trend, None);
    assert_eq!(dashboard.repos[0].name, "c");
    assert_eq!(dashboard.repos[0].risk_level, RiskLevel::Critical);
}

#[test]
fn test_previous_dashboard_sets_trend() {
    let snapshots = three_repositories();
    let earlier = aggregate(&[snapshot("a"), snapshot("b"), snapshot("c")], None, &ctx());
    let dashboard = aggregate(&snapshots, Some(&earlier), &ctx());

    assert_eq!(dashboard.security.previous_total_vulns, Some(0));
    assert_eq!(
        dashboard.security.vuln_trend,
        Some(org_metrics::aggregate::VulnTrend::Worsening)
    );
}

#[test]
fn test_archived_repositories_only_count_in_governance() {
    let mut fetched = empty_fetch();
    fetched.security.dependabot = decoded(vec![dependabot_alert("high", "open")]);
    let mut archived = snapshot_from("old", &fetched);
    archived.is_archived = true;
    let snapshots = vec![snapshot("live"), archived];

    let dashboard = aggregate(&snapshots, None, &ctx());

    assert_eq!(dashboard.repo_count, 2);
    assert_eq!(dashboard.scanned_repos, 1);
    assert_eq!(dashboard.security.high_vulns, Some(0));
    assert_eq!(dashboard.governance.archived_repos, 1);
    assert_eq!(dashboard.governance.scanned_repos, 1);
    assert_eq!(dashboard.governance.risk_high, 1);
    assert_eq!(dashboard.repos.len(), 2);
}

#[test]
fn test_security_shares_ignore_unreadable_alerts() {
    let mut unreadable = empty_fetch();
    unreadable.security.dependabot = denied();
    let mut vulnerable = empty_fetch();
    vulnerable.security.dependabot = decoded(vec![dependabot_alert("low", "open")]);
    let snapshots = vec![
        snapshot("clean"),
        snapshot_from("blind", &unreadable),
        snapshot_from("leaky", &vulnerable),
    ];

    let security = aggregate(&snapshots, None, &ctx()).security;

    assert_eq!(security.repos_without_alert_access, 1);
    assert_eq!(security.sla_compliance, Some(50.0));
    assert_eq!(security.dependabot_adoption, Some(66.67));
    assert_eq!(security.gate_pass_rate, Some(100.0));
}

#[test]
fn test_ci_adoption_over_known_status() {
    let mut with_ci = empty_fetch();
    with_ci.ci.workflows = decoded(vec![json!({ "id": 1, "state": "active" })]);
    let mut unknown = empty_fetch();
    unknown.ci.workflows = denied();
    let snapshots = vec![
        snapshot_from("built", &with_ci),
        snapshot("bare"),
        snapshot_from("hidden", &unknown),
    ];

    let ci = aggregate(&snapshots, None, &ctx()).ci;
    assert_eq!(ci.adoption, Some(50.0));
    assert_eq!(ci.success_rate, None);
}

#[test]
fn test_coverage_uses_listed_repository_count() {
    let snapshots = vec![snapshot("a"), snapshot("b")];
    let mut context = ctx();
    context.repos_listed = Some(4);

    let governance = aggregate(&snapshots, None, &context).governance;

    assert_eq!(governance.total_repos, 4);
    assert_eq!(governance.scan_coverage, Some(50.0));
    assert_eq!(governance.security_score_min, Some(100));
}

#[test]
fn test_contributors_merge_across_repositories() {
    let commit = |sha: &str, login: &str| {
        json!({ "sha": sha, "author": { "login": login }, "commit": { "author": null } })
    };
    let mut first = empty_fetch();
    first.commits = decoded(vec![commit("1", "amy"), commit("2", "amy"), commit("3", "bob")]);
    let mut second = empty_fetch();
    second.commits = decoded(vec![commit("4", "bob"), commit("5", "bob")]);
    let snapshots = vec![snapshot_from("x", &first), snapshot_from("y", &second)];

    let dashboard = aggregate(&snapshots, None, &ctx());

    let top = &dashboard.contributors[0];
    assert_eq!(top.login, "bob");
    assert_eq!(top.commits, 3);
    assert_eq!(top.repo_count, 2);
    assert_eq!(dashboard.totals.unique_contributors, 2);
    assert_eq!(dashboard.totals.multi_repo_contributors, 1);
    assert_eq!(dashboard.languages[0].language, "Rust");
    assert_eq!(dashboard.languages[0].repo_count, 2);
}

#[test]
fn test_lost_alert_access_is_not_an_improvement() {
    let mut exposed = empty_fetch();
    exposed.security.dependabot =
        decoded((0..5).map(|_| dependabot_alert("high", "open")).collect());
    let earlier = aggregate(&[snapshot_from("api", &exposed)], None, &ctx());
    assert_eq!(earlier.security.total_vulns, Some(5));

    let mut blind = empty_fetch();
    blind.security.dependabot = denied();
    let dashboard = aggregate(&[snapshot_from("api", &blind)], Some(&earlier), &ctx());

    assert_eq!(dashboard.security.total_vulns, None);
    assert_eq!(dashboard.security.high_vulns, None);
    assert_eq!(dashboard.security.previous_total_vulns, Some(5));
    assert_eq!(dashboard.security.vuln_trend, None);

    let json = serde_json::to_value(&dashboard).unwrap();
    assert!(json["security"]["total_vulns"].is_null());
}

#[test]
fn test_trend_compares_repositories_readable_in_both_runs() {
    let mut exposed = empty_fetch();
    exposed.security.dependabot =
        decoded((0..5).map(|_| dependabot_alert("high", "open")).collect());
    let earlier = aggregate(
        &[snapshot_from("api", &exposed), snapshot("web")],
        None,
        &ctx(),
    );

    let mut blind = empty_fetch();
    blind.security.dependabot = denied();
    let dashboard = aggregate(
        &[snapshot_from("api", &blind), snapshot("web"), snapshot("new")],
        Some(&earlier),
        &ctx(),
    );

    assert_eq!(dashboard.security.total_vulns, Some(0));
    assert_eq!(dashboard.security.previous_total_vulns, Some(5));
    assert_eq!(
        dashboard.security.vuln_trend,
        Some(org_metrics::aggregate::VulnTrend::Stable)
    );
}

#[test]
fn test_license_and_topic_histograms() {
    let mut unlicensed = snapshot("scratch");
    unlicensed.license = None;
    unlicensed.topics = vec!["api".to_string(), "backend".to_string()];
    let mut archived = snapshot("legacy");
    archived.is_archived = true;
    archived.license = Some("Apache-2.0".to_string());
    archived.topics = vec![];

    let dashboard = aggregate(&[snapshot("api"), unlicensed, archived], None, &ctx());

    let licenses: Vec<(&str, u64)> = dashboard
        .licenses
        .iter()
        .map(|l| (l.license.as_str(), l.repo_count))
        .collect();
    assert_eq!(licenses, vec![("Apache-2.0", 1), ("MIT", 1), ("None", 1)]);

    let topics: Vec<(&str, u64)> = dashboard
        .topics
        .iter()
        .map(|t| (t.topic.as_str(), t.repo_count))
        .collect();
    assert_eq!(topics, vec![("backend", 2), ("api", 1)]);
}

#[test]
fn test_topic_histogram_is_capped() {
    let mut tagged = snapshot("tagged");
    tagged.topics = (0..40).map(|i| format!("topic-{i:02}")).collect();

    let dashboard = aggregate(&[tagged], None, &ctx());

    assert_eq!(dashboard.topics.len(), 30);
    assert_eq!(dashboard.topics[0].topic, "topic-00");
}

#[test]
fn test_totals_and_leaderboards() {
    let mut popular = snapshot("popular");
    popular.stars = 500;
    popular.forks = 40;
    popular.commits.count_30d = Some(3);
    popular.issues.open = Some(9);
    let mut legacy = snapshot("legacy");
    legacy.is_archived = true;
    legacy.stars = 900;
    legacy.forks = 1;
    legacy.commits.count_30d = Some(50);
    legacy.issues.open = Some(70);
    let mut quiet = snapshot("quiet");
    quiet.commits.count_30d = None;
    quiet.issues.open = Some(1);
    quiet.description = Some("x".repeat(150));

    let dashboard = aggregate(&[popular, legacy, quiet], None, &ctx());

    assert_eq!(dashboard.totals.total_stars, 1412);
    assert_eq!(dashboard.totals.total_forks, 44);

    let names = |board: &[org_metrics::aggregate::types::RankedRepo]| -> Vec<String> {
        board.iter().map(|r| r.name.clone()).collect()
    };
    let top = &dashboard.top_repos;
    assert_eq!(names(&top.by_stars), vec!["legacy", "popular", "quiet"]);
    assert_eq!(top.by_stars[0].value, 900);
    assert_eq!(names(&top.by_forks), vec!["popular", "quiet", "legacy"]);
    // Archived repositories and unknown counts stay off the activity boards
    assert_eq!(names(&top.by_commits_30d), vec!["popular"]);
    assert_eq!(names(&top.by_open_issues), vec!["popular", "quiet"]);
    assert_eq!(top.by_open_issues[1].value, 1);

    let quiet_row = top.by_stars.iter().find(|r| r.name == "quiet").unwrap();
    assert_eq!(quiet_row.description.as_ref().map(|d| d.chars().count()), Some(100));
    assert_eq!(quiet_row.language.as_deref(), Some("Rust"));
}
