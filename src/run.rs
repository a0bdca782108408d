//! Run audit record: identity, timing, counts and rate-limit state

use crate::collector::CollectionReport;
use crate::error::{MetricsError, MetricsResult};
use crate::github::rate_limiter::RateLimitSnapshot;
use crate::schema::{self, RUN_METADATA};
use crate::storage::{self, DataLayout};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub repos_total: u64,
    pub repos_scanned: u64,
    pub repos_skipped: u64,
    pub repos_failed: u64,
    pub requests_made: u64,
    pub error_count: u64,
    pub rate_limit_remaining: u32,
    pub rate_limit_reset: DateTime<Utc>,
    pub stopped_early: bool,
    pub collector_version: String,
}

/// Tracks one run from start to its metadata file
#[derive(Clone, Debug)]
pub struct RunRecorder {
    run_id: String,
    started_at: DateTime<Utc>,
}

impl RunRecorder {
    /// Fresh run id, started now
    pub fn start() -> Self {
        Self::new(Uuid::new_v4().to_string(), Utc::now())
    }

    pub fn new(run_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finish(
        &self,
        report: &CollectionReport,
        rate: &RateLimitSnapshot,
        finished_at: DateTime<Utc>,
    ) -> RunMetadata {
        let elapsed = (finished_at - self.started_at).num_milliseconds().max(0);
        RunMetadata {
            run_id: self.run_id.clone(),
            started_at: self.started_at,
            finished_at,
            duration_secs: elapsed as f64 / 1000.0,
            repos_total: report.repos_total,
            repos_scanned: report.repos_scanned,
            repos_skipped: report.repos_skipped,
            repos_failed: report.repos_failed,
            requests_made: rate.requests_made,
            error_count: report.error_count,
            rate_limit_remaining: rate.remaining,
            rate_limit_reset: rate.reset_time,
            stopped_early: report.stopped_early || rate.exhausted,
            collector_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl RunMetadata {
    /// Validate and write `runs/<run_id>.json`.
    pub async fn persist(&self, layout: &DataLayout) -> MetricsResult<PathBuf> {
        let value =
            serde_json::to_value(self).map_err(|e| MetricsError::json("run metadata", e))?;
        schema::assert_valid(&value, RUN_METADATA, "run", "run metadata")?;
        let path = layout.run_metadata(&self.run_id);
        storage::write_json(&path, &value).await?;
        Ok(path)
    }
}
