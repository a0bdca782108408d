//! Tests for issue metrics.

use crate::support::{days_ago, decoded, denied, hours_ago, now, stamp};
use org_metrics::collector::issues::{IssueInputs, extract_issue_metrics};
use serde_json::{Value, json};

fn issue(number: u64, labels: &[&str], created: i64, updated: i64, closed: Option<i64>) -> Value {
    json!({
        "number": number,
        "state": if closed.is_some() { "closed" } else { "open" },
        "created_at": stamp(days_ago(created)),
        "updated_at": stamp(days_ago(updated)),
        "closed_at": closed.map(|d| stamp(days_ago(d))),
        "labels": labels.iter().map(|l| json!({ "name": l })).collect::<Vec<_>>()
    })
}

#[test]
fn test_pull_requests_are_not_counted_as_issues() {
    let mut pr = issue(9, &["bug"], 3, 1, None);
    pr["pull_request"] = json!({ "url": "https://api.github.com/repos/acme/api/pulls/9" });
    let inputs = IssueInputs {
        open: decoded(vec![issue(1, &[], 3, 1, None), pr]),
        recent: decoded(vec![]),
    };
    let metrics = extract_issue_metrics(&inputs, now());

    assert_eq!(metrics.open, Some(1));
    assert_eq!(metrics.bugs_open, Some(0));
}

#[test]
fn test_labels_match_case_insensitively() {
    let inputs = IssueInputs {
        open: decoded(vec![
            issue(1, &["Bug"], 3, 1, None),
            issue(2, &["type: bug", "Critical"], 3, 1, None),
            issue(3, &["SECURITY"], 3, 1, None),
            issue(4, &["debugging"], 3, 1, None),
        ]),
        recent: decoded(vec![]),
    };
    let metrics = extract_issue_metrics(&inputs, now());

    assert_eq!(metrics.bugs_open, Some(2));
    assert_eq!(metrics.critical, Some(1));
    assert_eq!(metrics.security, Some(1));
}

#[test]
fn test_mttr_over_issues_closed_in_window() {
    let mut quick = issue(1, &[], 0, 0, None);
    quick["created_at"] = json!(stamp(hours_ago(30)));
    quick["closed_at"] = json!(stamp(hours_ago(20)));
    quick["state"] = json!("closed");
    let mut slow = issue(2, &[], 0, 0, None);
    slow["created_at"] = json!(stamp(hours_ago(60)));
    slow["closed_at"] = json!(stamp(hours_ago(30)));
    slow["state"] = json!("closed");

    let inputs = IssueInputs {
        open: decoded(vec![]),
        recent: decoded(vec![quick, slow, issue(3, &[], 80, 40, Some(40))]),
    };
    let metrics = extract_issue_metrics(&inputs, now());

    assert_eq!(metrics.closed_30d, Some(2));
    assert_eq!(metrics.mttr_hours, Some(20.0));
}

#[test]
fn test_no_closed_issues_leaves_mttr_null() {
    let inputs = IssueInputs {
        open: decoded(vec![issue(1, &[], 3, 1, None)]),
        recent: decoded(vec![issue(1, &[], 3, 1, None)]),
    };
    let metrics = extract_issue_metrics(&inputs, now());

    assert_eq!(metrics.closed_30d, Some(0));
    assert_eq!(metrics.mttr_hours, None);
}

#[test]
fn test_bugs_created_in_last_90_days() {
    let inputs = IssueInputs {
        open: decoded(vec![]),
        recent: decoded(vec![
            issue(1, &["bug"], 10, 5, None),
            issue(2, &["bug"], 60, 5, Some(50)),
            issue(3, &["bug"], 200, 5, None),
            issue(4, &["enhancement"], 10, 5, None),
        ]),
    };
    let metrics = extract_issue_metrics(&inputs, now());
    assert_eq!(metrics.bugs_created_90d, Some(2));
}

#[test]
fn test_stale_after_sixty_days() {
    let inputs = IssueInputs {
        open: decoded(vec![
            issue(1, &[], 100, 61, None),
            issue(2, &[], 100, 59, None),
        ]),
        recent: decoded(vec![]),
    };
    assert_eq!(extract_issue_metrics(&inputs, now()).stale, Some(1));
}

#[test]
fn test_denied_recent_listing_keeps_open_counts() {
    let inputs = IssueInputs {
        open: decoded(vec![issue(1, &["bug"], 3, 1, None)]),
        recent: denied(),
    };
    let metrics = extract_issue_metrics(&inputs, now());

    assert_eq!(metrics.open, Some(1));
    assert_eq!(metrics.closed_30d, None);
    assert_eq!(metrics.bugs_created_90d, None);
    assert!(!metrics.available);
    assert_eq!(metrics.errors[0].field, "issues.closed_30d");
}
