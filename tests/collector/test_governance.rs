//! Tests for scores, risk classification and activity status.

use crate::support::{
    days_ago, decoded, denied, dependabot_alert, empty_fetch, now, snapshot, snapshot_from,
};
use org_metrics::collector::governance::{activity_status, classify_risk};
use org_metrics::collector::types::{ActivityStatus, RiskLevel};
use serde_json::json;

#[test]
fn test_clean_repository_is_low_risk() {
    let snap = snapshot("clean");
    let governance = &snap.governance;

    assert_eq!(governance.risk.level, RiskLevel::Low);
    assert_eq!(governance.risk.score, 0);
    assert!(governance.risk.factors.is_empty());
    assert_eq!(governance.security_score, 100);
}

#[test]
fn test_high_alerts_without_criticals_is_high_risk() {
    let mut fetched = empty_fetch();
    fetched.security.dependabot = decoded(vec![
        dependabot_alert("high", "open"),
        dependabot_alert("high", "open"),
        dependabot_alert("high", "open"),
    ]);
    let snap = snapshot_from("svc", &fetched);
    let risk = &snap.governance.risk;

    assert_eq!(snap.security.critical, Some(0));
    assert_eq!(risk.level, RiskLevel::High);
    assert_eq!(risk.score, 30);
    assert_eq!(risk.factors, vec!["3 high vulnerabilities".to_string()]);
}

#[test]
fn test_critical_alert_or_secret_is_critical_risk() {
    let mut fetched = empty_fetch();
    fetched.security.dependabot = decoded(vec![dependabot_alert("critical", "open")]);
    let snap = snapshot_from("svc", &fetched);
    assert_eq!(snap.governance.risk.level, RiskLevel::Critical);
    assert!(
        snap.governance
            .risk
            .factors
            .contains(&"1 critical vulnerabilities".to_string())
    );

    let mut fetched = empty_fetch();
    fetched.security.secret_scanning = decoded(vec![json!({ "state": "open" })]);
    let snap = snapshot_from("svc", &fetched);
    assert_eq!(snap.governance.risk.level, RiskLevel::Critical);
    assert_eq!(snap.governance.risk.score, 20);
}

#[test]
fn test_medium_only_is_medium_risk() {
    let mut fetched = empty_fetch();
    fetched.security.dependabot = decoded(vec![dependabot_alert("moderate", "open")]);
    let snap = snapshot_from("svc", &fetched);
    assert_eq!(snap.governance.risk.level, RiskLevel::Medium);
}

#[test]
fn test_missing_protection_and_alert_access_are_factors() {
    let mut fetched = empty_fetch();
    fetched.security.dependabot = denied();
    fetched.security.branch_protection = org_metrics::ApiResponse::Success(false);
    let snap = snapshot_from("svc", &fetched);
    let risk = classify_risk(&snap.security);

    assert_eq!(risk.level, RiskLevel::Low);
    assert_eq!(risk.score, 10);
    assert_eq!(
        risk.factors,
        vec![
            "no branch protection".to_string(),
            "dependency alerts unavailable".to_string()
        ]
    );
    // branch protection, dependabot and the zero-vulnerability bonus are lost
    assert_eq!(snap.governance.security_score, 50);
}

#[test]
fn test_health_score_rewards_activity_and_ci() {
    let mut fetched = empty_fetch();
    fetched.commits = decoded(vec![json!({
        "sha": "abc",
        "author": { "login": "amy" },
        "commit": { "author": null }
    })]);
    let baseline = snapshot("svc").governance.health_score;
    let active = snapshot_from("svc", &fetched).governance.health_score;

    // description, not archived, branch protection, few stale issues
    assert_eq!(baseline, 45);
    assert_eq!(active, 60);
}

#[test]
fn test_activity_status_thresholds() {
    assert_eq!(
        activity_status(false, Some(days_ago(29)), now()),
        (ActivityStatus::Active, Some(29))
    );
    assert_eq!(
        activity_status(false, Some(days_ago(30)), now()).0,
        ActivityStatus::Stale
    );
    assert_eq!(
        activity_status(false, Some(days_ago(180)), now()).0,
        ActivityStatus::Stale
    );
    assert_eq!(
        activity_status(false, Some(days_ago(181)), now()).0,
        ActivityStatus::Inactive
    );
    assert_eq!(
        activity_status(false, None, now()),
        (ActivityStatus::Inactive, None)
    );
    assert_eq!(
        activity_status(true, Some(days_ago(1)), now()).0,
        ActivityStatus::Archived
    );
}
