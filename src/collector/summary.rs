//! Organization governance summary written at the end of a collection

use crate::collector::types::{ActivityStatus, RepositorySnapshot, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskHistogram {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityHistogram {
    pub active: u64,
    pub stale: u64,
    pub inactive: u64,
    pub archived: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoGovernance {
    pub name: String,
    pub risk_level: RiskLevel,
    pub health_score: u32,
    pub security_score: u32,
    pub activity_status: ActivityStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrgGovernanceSummary {
    pub org_name: String,
    pub run_id: String,
    pub collected_at: DateTime<Utc>,
    pub repos_total: u64,
    pub repos_scanned: u64,
    pub repos_skipped: u64,
    pub risk: RiskHistogram,
    pub activity: ActivityHistogram,
    pub repos: Vec<RepoGovernance>,
}

impl OrgGovernanceSummary {
    /// Summarize the written snapshots. `repos_total` is the listing size;
    /// `repos_skipped` the repositories never collected.
    pub fn from_snapshots(
        org_name: &str,
        run_id: &str,
        collected_at: DateTime<Utc>,
        snapshots: &[RepositorySnapshot],
        repos_total: u64,
        repos_skipped: u64,
    ) -> Self {
        let mut risk = RiskHistogram::default();
        let mut activity = ActivityHistogram::default();
        let mut repos = Vec::with_capacity(snapshots.len());

        for snapshot in snapshots {
            let governance = &snapshot.governance;
            match governance.risk.level {
                RiskLevel::Critical => risk.critical += 1,
                RiskLevel::High => risk.high += 1,
                RiskLevel::Medium => risk.medium += 1,
                RiskLevel::Low => risk.low += 1,
            }
            match governance.activity_status {
                ActivityStatus::Active => activity.active += 1,
                ActivityStatus::Stale => activity.stale += 1,
                ActivityStatus::Inactive => activity.inactive += 1,
                ActivityStatus::Archived => activity.archived += 1,
            }
            repos.push(RepoGovernance {
                name: snapshot.name.clone(),
                risk_level: governance.risk.level,
                health_score: governance.health_score,
                security_score: governance.security_score,
                activity_status: governance.activity_status,
            });
        }
        repos.sort_by(|a, b| a.risk_level.cmp(&b.risk_level).then_with(|| a.name.cmp(&b.name)));

        Self {
            org_name: org_name.to_string(),
            run_id: run_id.to_string(),
            collected_at,
            repos_total,
            repos_scanned: snapshots.len() as u64,
            repos_skipped,
            risk,
            activity,
            repos,
        }
    }
}
