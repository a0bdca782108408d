//! Organization rollup of repository snapshots
//!
//! [`aggregate`] is the pure computation. [`Aggregator`] wraps it with the
//! batch I/O: load and validate `raw/*.json`, load the previous history
//! snapshot, aggregate, validate the result, write the dashboard and today's
//! history file.

pub mod dora;
pub mod history;
pub mod rollup;
pub mod trend;
pub mod types;

pub use history::HistoryStore;
pub use types::{AggregatedDashboard, VulnTrend};

use crate::collector::types::RepositorySnapshot;
use crate::error::{MetricsError, MetricsResult};
use crate::schema::{self, AGGREGATED_DASHBOARD, ORG_GOVERNANCE_SUMMARY, REPOSITORY_SNAPSHOT};
use crate::storage::{self, DataLayout};
use chrono::{DateTime, Utc};
use log::{info, warn};

/// Identity of one aggregation run
#[derive(Clone, Debug)]
pub struct AggregateContext {
    pub org_name: String,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    /// Repositories the listing returned; defaults to the snapshot count
    pub repos_listed: Option<u64>,
}

/// Compute the dashboard from `snapshots` and the previous dashboard, if any.
pub fn aggregate(
    snapshots: &[RepositorySnapshot],
    previous: Option<&AggregatedDashboard>,
    ctx: &AggregateContext,
) -> AggregatedDashboard {
    let active: Vec<&RepositorySnapshot> = snapshots.iter().filter(|r| !r.is_archived).collect();
    let repos_listed = ctx
        .repos_listed
        .unwrap_or(snapshots.len() as u64)
        .max(snapshots.len() as u64);

    let repos = rollup::repo_rows(snapshots);
    let mut security = rollup::security(&active);
    security.previous_total_vulns = previous.and_then(|p| p.security.total_vulns);
    let (now, then) = previous
        .and_then(|p| trend::comparable_totals(&repos, &p.repos))
        .unzip();
    security.vuln_trend = trend::vulnerability_trend(now, then);

    AggregatedDashboard {
        org_name: ctx.org_name.clone(),
        generated_at: ctx.generated_at,
        run_id: ctx.run_id.clone(),
        repo_count: snapshots.len() as u64,
        scanned_repos: active.len() as u64,
        dora: dora::summarize(&active),
        flow: rollup::flow(&active),
        ci: rollup::ci(&active),
        security,
        issues: rollup::issues(&active),
        governance: rollup::governance(snapshots, repos_listed),
        totals: rollup::totals(snapshots, &active),
        contributors: rollup::contributors(&active),
        languages: rollup::languages(&active),
        licenses: rollup::licenses(snapshots),
        topics: rollup::topics(snapshots),
        top_repos: rollup::top_repos(snapshots, &active),
        repos,
    }
}

/// Batch driver around [`aggregate`]
pub struct Aggregator {
    layout: DataLayout,
}

impl Aggregator {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// Load and validate every raw snapshot. Any invalid file aborts.
    pub fn load_snapshots(&self) -> MetricsResult<Vec<RepositorySnapshot>> {
        let files = storage::json_files(&self.layout.raw_dir())?;
        let mut snapshots = Vec::with_capacity(files.len());
        for path in files {
            let value = storage::read_json(&path)?;
            let artifact = format!("snapshot {}", path.display());
            schema::assert_valid(&value, REPOSITORY_SNAPSHOT, "repo", &artifact)?;
            let snapshot: RepositorySnapshot = serde_json::from_value(value)
                .map_err(|e| MetricsError::json(artifact.clone(), e))?;
            snapshots.push(snapshot);
        }
        Ok(snapshots)
    }

    /// Repository count from the collector's governance summary, when present
    fn repos_listed(&self) -> Option<u64> {
        let path = self.layout.governance_summary();
        if !path.exists() {
            return None;
        }
        match storage::read_json(&path) {
            Ok(value) => {
                if let Err(e) =
                    schema::assert_valid(&value, ORG_GOVERNANCE_SUMMARY, "governance", "governance summary")
                {
                    warn!("Ignoring governance summary: {e}");
                    return None;
                }
                value.get("repos_total").and_then(|v| v.as_u64())
            }
            Err(e) => {
                warn!("Ignoring governance summary: {e}");
                None
            }
        }
    }

    /// Run the whole aggregation stage and persist its outputs.
    pub fn run(&self, ctx: &AggregateContext) -> MetricsResult<AggregatedDashboard> {
        let snapshots = self.load_snapshots()?;
        if snapshots.is_empty() {
            return Err(MetricsError::NoSnapshots(self.layout.raw_dir()));
        }
        info!("Aggregating {} repository snapshots", snapshots.len());

        let history = HistoryStore::new(self.layout.clone());
        let today = ctx.generated_at.date_naive();
        let previous = history.previous(today)?;
        match &previous {
            Some((day, _)) => info!("Comparing against history snapshot of {day}"),
            None => info!("No previous history snapshot, trend will be null"),
        }

        let mut ctx = ctx.clone();
        if ctx.repos_listed.is_none() {
            ctx.repos_listed = self.repos_listed();
        }

        let dashboard = aggregate(&snapshots, previous.as_ref().map(|(_, d)| d), &ctx);
        let value = serde_json::to_value(&dashboard)
            .map_err(|e| MetricsError::json("aggregated dashboard", e))?;
        schema::assert_valid(&value, AGGREGATED_DASHBOARD, "dashboard", "aggregated dashboard")?;

        storage::write_json_blocking(&self.layout.dashboard(), &value)?;
        let history_path = history.save(today, &value)?;
        info!(
            "Wrote {} and {}",
            self.layout.dashboard().display(),
            history_path.display()
        );
        Ok(dashboard)
    }
}
