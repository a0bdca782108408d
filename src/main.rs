// org-metrics: collect the organization's repositories, record the run, and
// aggregate the snapshots into the dashboard and today's history file.
//
// Configuration comes from the environment (GITHUB_TOKEN, GITHUB_ORG, ...),
// optionally layered over a TOML file named by METRICS_CONFIG.

use anyhow::{Context, Result};
use chrono::Utc;
use env_logger::Env;
use log::{info, warn};
use org_metrics::github::RateLimitContext;
use org_metrics::{
    AggregateContext, Aggregator, DataLayout, GitHubClient, RepositoryCollector, RunRecorder,
    Settings,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env().context("Invalid configuration")?;
    let layout = DataLayout::new(&settings.data_dir);

    let mut builder = GitHubClient::builder().personal_token(settings.token.clone());
    if let Some(url) = &settings.api_url {
        builder = builder.base_uri(url.clone());
    }
    let client = builder.build().context("Failed to build GitHub client")?;

    let rate = Arc::new(RateLimitContext::new(
        settings.collector.rate_limit_buffer,
        settings.collector.max_rate_wait,
    ));
    match client.rate_limit().await {
        Ok(quota) => {
            info!(
                "Rate limit: {} requests remaining, resets at {}",
                quota.remaining, quota.reset_time
            );
            rate.update(quota.remaining, quota.reset_time).await;
        }
        Err(e) => warn!("Could not read the rate limit, assuming a full budget: {e}"),
    }

    let recorder = RunRecorder::start();
    info!("Run {} for '{}'", recorder.run_id(), settings.org);

    let collector = RepositoryCollector::new(
        Arc::new(client),
        rate.clone(),
        settings.collector.clone(),
        layout.clone(),
        recorder.run_id(),
    );
    let report = if settings.repositories.is_empty() {
        collector.collect_organization(&settings.org).await
    } else {
        collector
            .collect_named(&settings.org, &settings.repositories)
            .await
    }
    .context("Collection failed")?;

    info!(
        "Collected {}/{} repositories ({} skipped, {} failed, {} field errors)",
        report.repos_scanned,
        report.repos_total,
        report.repos_skipped,
        report.repos_failed,
        report.error_count
    );

    let metadata = recorder.finish(&report, &rate.snapshot().await, Utc::now());
    let run_path = metadata
        .persist(&layout)
        .await
        .context("Failed to write run metadata")?;
    info!("Run metadata written to {}", run_path.display());

    let ctx = AggregateContext {
        org_name: settings.org.clone(),
        run_id: recorder.run_id().to_string(),
        generated_at: Utc::now(),
        repos_listed: Some(report.repos_total),
    };
    let dashboard = Aggregator::new(layout)
        .run(&ctx)
        .context("Aggregation failed")?;

    info!(
        "Dashboard: {} repositories, DORA overall {}, open vulnerabilities {} ({})",
        dashboard.repo_count,
        dashboard
            .dora
            .overall
            .map(|band| band.to_string())
            .unwrap_or_else(|| "n/a".to_string()),
        dashboard
            .security
            .total_vulns
            .map(|total| total.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        dashboard
            .security
            .vuln_trend
            .map(|trend| format!("{trend:?}"))
            .unwrap_or_else(|| "no trend yet".to_string()),
    );

    Ok(())
}
