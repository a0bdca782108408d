//! End-to-end collection over an in-memory source.

use crate::support::{DelayedSource, FakeSource, dependabot_alert, repo_json, repo_record};
use chrono::{Duration as ChronoDuration, Utc};
use org_metrics::collector::effective_concurrency;
use org_metrics::collector::types::RiskLevel;
use org_metrics::github::{ApiResponse, RateLimitContext};
use org_metrics::storage::read_json;
use org_metrics::{CollectorConfig, DataLayout, MetricsError, RepositoryCollector};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn collector(
    source: FakeSource,
    rate: RateLimitContext,
    dir: &TempDir,
) -> RepositoryCollector<FakeSource> {
    RepositoryCollector::new(
        Arc::new(source),
        Arc::new(rate),
        CollectorConfig::default(),
        DataLayout::new(dir.path()),
        "run-1",
    )
}

fn delayed_collector(
    source: Arc<DelayedSource>,
    config: CollectorConfig,
    dir: &TempDir,
) -> RepositoryCollector<DelayedSource> {
    RepositoryCollector::new(
        source,
        Arc::new(budget()),
        config,
        DataLayout::new(dir.path()),
        "run-1",
    )
}

fn budget() -> RateLimitContext {
    RateLimitContext::new(10, Duration::from_secs(1))
}

#[tokio::test]
async fn test_collects_every_listed_repository() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new()
        .with_list("/orgs/acme/repos", vec![repo_json("api"), repo_json("web")])
        .with_list(
            "/repos/acme/api/dependabot/alerts",
            vec![dependabot_alert("critical", "open")],
        );

    let report = collector(source, budget(), &dir)
        .collect_organization("acme")
        .await
        .unwrap();

    assert_eq!(report.repos_total, 2);
    assert_eq!(report.repos_scanned, 2);
    assert_eq!(report.repos_skipped, 0);
    assert_eq!(report.repos_failed, 0);
    assert!(!report.stopped_early);
    assert!(report.error_count > 0);

    let layout = DataLayout::new(dir.path());
    let api = read_json(&layout.raw_snapshot("api")).unwrap();
    assert_eq!(api["security"]["critical"], 1);
    assert_eq!(api["run_id"], "run-1");
    // Endpoints the source does not serve stay null
    assert!(api["pr"]["open"].is_null());
    assert!(layout.raw_snapshot("web").exists());

    let governance = read_json(&layout.governance_summary()).unwrap();
    assert_eq!(governance["repos_scanned"], 2);
    assert_eq!(governance["risk"]["critical"], 1);
    assert_eq!(report.governance.risk.critical, 1);
    let api_row = report
        .governance
        .repos
        .iter()
        .find(|r| r.name == "api")
        .unwrap();
    assert_eq!(api_row.risk_level, RiskLevel::Critical);
}

#[tokio::test]
async fn test_listing_failure_aborts_collection() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new().with_response(
        "/orgs/acme/repos",
        ApiResponse::PermissionDenied("HTTP 403: Bad credentials".to_string()),
    );

    let result = collector(source, budget(), &dir)
        .collect_organization("acme")
        .await;

    assert!(matches!(result, Err(MetricsError::Listing { .. })));
    assert!(!DataLayout::new(dir.path()).governance_summary().exists());
}

#[tokio::test]
async fn test_exhausted_budget_skips_remaining_repositories() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new().with_list(
        "/orgs/acme/repos",
        vec![repo_json("api"), repo_json("web"), repo_json("docs")],
    );
    // One request above the buffer, reset far beyond the maximum wait
    let rate = RateLimitContext::with_state(
        11,
        Utc::now() + ChronoDuration::hours(2),
        10,
        Duration::from_secs(1),
    );

    let report = collector(source, rate, &dir)
        .collect_organization("acme")
        .await
        .unwrap();

    assert!(report.stopped_early);
    assert_eq!(report.repos_total, 3);
    assert_eq!(report.repos_scanned, 1);
    assert_eq!(report.repos_skipped, 2);
    assert_eq!(report.governance.repos_skipped, 2);
}

#[tokio::test]
async fn test_named_repositories_are_fetched_individually() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new().with_body("/repos/acme/api", repo_json("api"));

    let report = collector(source, budget(), &dir)
        .collect_named("acme", &["api".to_string(), "ghost".to_string()])
        .await
        .unwrap();

    assert_eq!(report.repos_total, 2);
    assert_eq!(report.repos_scanned, 1);
    assert_eq!(report.repos_failed, 1);
    assert_eq!(report.snapshots[0].name, "api");
}

#[test]
fn test_concurrency_follows_remaining_budget() {
    assert_eq!(effective_concurrency(4, 5000, 35), 4);
    assert_eq!(effective_concurrency(4, 70, 35), 2);
    assert_eq!(effective_concurrency(4, 0, 35), 1);
    assert_eq!(effective_concurrency(4, 100, 0), 4);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_endpoint_is_recorded_as_timeout() {
    let dir = TempDir::new().unwrap();
    let alerts = "/repos/acme/api/dependabot/alerts";
    let source = DelayedSource::new(
        FakeSource::new().with_list(alerts, vec![dependabot_alert("high", "open")]),
        Duration::from_millis(10),
    )
    .with_route_delay(alerts, Duration::from_secs(600));

    let snapshot = delayed_collector(Arc::new(source), CollectorConfig::default(), &dir)
        .collect_repository(&repo_record("api"))
        .await;

    assert_eq!(snapshot.security.high, None);
    assert_eq!(snapshot.security.total_vulns, None);
    let timed_out = snapshot
        .errors()
        .find(|e| e.field == "security.dependabot")
        .unwrap();
    assert!(timed_out.reason.contains("timed out"), "{}", timed_out.reason);
}

#[tokio::test(start_paused = true)]
async fn test_worker_pool_never_exceeds_its_width() {
    let dir = TempDir::new().unwrap();
    let names = ["api", "web", "docs", "cli", "sdk"];
    let source = Arc::new(DelayedSource::new(
        FakeSource::new().with_list(
            "/orgs/acme/repos",
            names.iter().map(|name| repo_json(name)).collect(),
        ),
        Duration::from_millis(50),
    ));
    let config = CollectorConfig {
        concurrency_limit: 2,
        ..CollectorConfig::default()
    };

    let report = delayed_collector(source.clone(), config, &dir)
        .collect_organization("acme")
        .await
        .unwrap();

    assert_eq!(report.repos_scanned, 5);
    assert_eq!(source.peak_in_flight(), 2);
}
