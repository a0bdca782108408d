//! Tests for the security extractor and the security gate.

use crate::support::{days_ago, decoded, denied, dependabot_alert, now, stamp, unavailable};
use org_metrics::collector::security::{SecurityInputs, extract_security_metrics};
use org_metrics::github::ApiResponse;
use serde_json::{Value, json};

fn inputs(dependabot: Vec<Value>) -> SecurityInputs {
    SecurityInputs {
        dependabot: decoded(dependabot),
        secret_scanning: decoded(vec![]),
        code_scanning: decoded(vec![]),
        branch_protection: ApiResponse::Success(true),
        security_policy: ApiResponse::Success(Some(".github/SECURITY.md".to_string())),
    }
}

fn fixed_alert(created_days: i64, fixed_days: i64) -> Value {
    json!({
        "state": "fixed",
        "security_advisory": { "severity": "high" },
        "created_at": stamp(days_ago(created_days)),
        "fixed_at": stamp(days_ago(fixed_days)),
        "dismissed_at": null
    })
}

#[test]
fn test_counts_open_alerts_by_severity() {
    let metrics = extract_security_metrics(
        &inputs(vec![
            dependabot_alert("critical", "open"),
            dependabot_alert("high", "open"),
            dependabot_alert("high", "open"),
            dependabot_alert("moderate", "open"),
            dependabot_alert("low", "open"),
            dependabot_alert("critical", "fixed"),
            dependabot_alert("high", "dismissed"),
        ]),
        now(),
    );

    assert_eq!(metrics.critical, Some(1));
    assert_eq!(metrics.high, Some(2));
    assert_eq!(metrics.medium, Some(1));
    assert_eq!(metrics.low, Some(1));
    assert_eq!(metrics.total_vulns, Some(5));
    assert!(!metrics.gate_pass);
}

#[test]
fn test_clean_repository_passes_gate() {
    let metrics = extract_security_metrics(&inputs(vec![]), now());

    assert_eq!(metrics.total_vulns, Some(0));
    assert!(metrics.gate_pass);
    assert!(metrics.branch_protection);
    assert!(metrics.security_policy);
    assert!(metrics.errors.is_empty());
}

#[test]
fn test_open_secret_fails_gate() {
    let mut security = inputs(vec![]);
    security.secret_scanning = decoded(vec![
        json!({ "state": "open" }),
        json!({ "state": "resolved" }),
    ]);
    let metrics = extract_security_metrics(&security, now());

    assert_eq!(metrics.secrets, Some(1));
    assert!(!metrics.gate_pass);
}

#[test]
fn test_critical_code_scanning_alert_fails_gate() {
    let mut security = inputs(vec![]);
    security.code_scanning = decoded(vec![
        json!({ "state": "open", "rule": { "security_severity_level": "critical", "severity": "error" } }),
        json!({ "state": "open", "rule": { "security_severity_level": "medium", "severity": "warning" } }),
    ]);
    let metrics = extract_security_metrics(&security, now());

    assert_eq!(metrics.code_alerts, Some(2));
    assert!(!metrics.gate_pass);
}

#[test]
fn test_unreadable_alerts_are_null_not_zero() {
    let mut security = inputs(vec![]);
    security.dependabot = denied();
    security.secret_scanning = unavailable();
    let metrics = extract_security_metrics(&security, now());

    assert_eq!(metrics.critical, None);
    assert_eq!(metrics.total_vulns, None);
    assert_eq!(metrics.secrets, None);
    assert!(!metrics.dependabot);
    assert!(!metrics.available_dependabot);
    // Unknown counts do not fail the gate on their own
    assert!(metrics.gate_pass);

    let fields: Vec<&str> = metrics.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["security.dependabot", "security.secret_scanning"]);
}

#[test]
fn test_mttr_over_alerts_resolved_in_window() {
    let metrics = extract_security_metrics(
        &inputs(vec![
            fixed_alert(12, 10),
            fixed_alert(14, 10),
            fixed_alert(100, 60),
            dependabot_alert("low", "open"),
        ]),
        now(),
    );
    // 48h and 96h; the alert fixed 60 days ago is outside the window
    assert_eq!(metrics.security_mttr_hours, Some(72.0));
}

#[test]
fn test_auto_dismissed_alerts_count_as_resolved() {
    let auto_dismissed = json!({
        "state": "auto_dismissed",
        "security_advisory": { "severity": "high" },
        "created_at": stamp(days_ago(12)),
        "fixed_at": null,
        "dismissed_at": null,
        "auto_dismissed_at": stamp(days_ago(10))
    });
    let metrics = extract_security_metrics(
        &inputs(vec![auto_dismissed, fixed_alert(14, 10)]),
        now(),
    );
    // 48h and 96h
    assert_eq!(metrics.security_mttr_hours, Some(72.0));
    assert_eq!(metrics.high, Some(0));
}

#[test]
fn test_branch_protection_failure_is_recorded() {
    let mut security = inputs(vec![]);
    security.branch_protection =
        ApiResponse::PermissionDenied("HTTP 403: Must have admin rights".to_string());
    security.security_policy = ApiResponse::Success(None);
    let metrics = extract_security_metrics(&security, now());

    assert!(!metrics.branch_protection);
    assert!(!metrics.available_branch_protection);
    assert!(!metrics.security_policy);
    assert_eq!(metrics.errors.len(), 1);
    assert_eq!(metrics.errors[0].field, "security.branch_protection");
}
