//! Per-repository collection
//!
//! [`RepositoryCollector`] lists the organization's repositories and runs a
//! bounded worker pool over them. Each worker fetches every endpoint of one
//! repository sequentially, feeds the results through the extractors, and
//! validates and writes the snapshot. The shared rate-limit budget is the only
//! state the workers have in common.

pub mod ci;
pub mod commits;
pub mod dora;
pub mod flow;
pub mod governance;
pub mod issues;
pub mod security;
pub mod summary;
pub mod types;

pub use summary::OrgGovernanceSummary;
pub use types::RepositorySnapshot;

use crate::config::CollectorConfig;
use crate::error::{MetricsError, MetricsResult};
use crate::github::endpoints::{RepoApi, list_repositories};
use crate::github::error::{ApiResponse, FieldError};
use crate::github::pagination::{PageSet, PageSource};
use crate::github::rate_limiter::RateLimitContext;
use crate::github::records::{Commit, Release, RepositoryRecord};
use crate::schema::{self, ORG_GOVERNANCE_SUMMARY, REPOSITORY_SNAPSHOT};
use crate::storage::{self, DataLayout};
use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::sync::Arc;

pub(crate) const WINDOW_30D: i64 = 30;
pub(crate) const WINDOW_90D: i64 = 90;

/// Record a failed call against `field`
pub(crate) fn note_failure<T>(
    errors: &mut Vec<FieldError>,
    field: &str,
    response: &ApiResponse<T>,
) {
    if let Some(reason) = response.failure_reason() {
        errors.push(FieldError::new(field, reason));
    }
}

/// Worker-pool width the remaining budget can sustain, never below one.
pub fn effective_concurrency(configured: usize, remaining: u32, per_repo_estimate: u32) -> usize {
    let affordable = (remaining / per_repo_estimate.max(1)) as usize;
    configured.min(affordable).max(1)
}

/// Every response fetched for one repository
pub struct FetchedRepository {
    pub releases: PageSet<Release>,
    pub pull_requests: flow::PullRequestInputs,
    pub issues: issues::IssueInputs,
    pub ci: ci::CiInputs,
    pub commits: PageSet<Commit>,
    pub security: security::SecurityInputs,
}

/// Run every extractor over `fetched` and assemble the snapshot.
pub fn build_snapshot(
    record: &RepositoryRecord,
    fetched: &FetchedRepository,
    now: DateTime<Utc>,
    run_id: &str,
    config: &CollectorConfig,
) -> RepositorySnapshot {
    let pr = flow::extract_pull_request_metrics(&fetched.pull_requests, now);
    let issues = issues::extract_issue_metrics(&fetched.issues, now);
    let ci = ci::extract_ci_metrics(&fetched.ci, now, config.duration_sample_cap);
    let security = security::extract_security_metrics(&fetched.security, now);
    let commits = commits::extract_commit_metrics(&fetched.commits, config.top_contributors);
    let dora = dora::extract_dora_metrics(
        &dora::DoraInputs {
            releases: &fetched.releases,
            lead_time_hours: pr.lead_time_hours,
            mttr_hours: issues.mttr_hours,
            bugs_created_90d: issues.bugs_created_90d,
        },
        now,
    );

    let license = record.spdx_license();
    let governance = governance::assess(
        &governance::GovernanceInputs {
            has_description: record
                .description
                .as_deref()
                .is_some_and(|d| !d.trim().is_empty()),
            is_archived: record.archived,
            license: license.as_deref(),
            updated_at: record.updated_at,
            pr: &pr,
            issues: &issues,
            ci: &ci,
            security: &security,
            commits: &commits,
        },
        now,
    );

    RepositorySnapshot {
        name: record.name.clone(),
        full_name: record.full_name.clone(),
        url: record.html_url.clone(),
        description: record.description.clone(),
        language: record.language.clone(),
        license,
        is_archived: record.archived,
        is_fork: record.fork,
        is_private: record.private,
        default_branch: record
            .default_branch
            .clone()
            .unwrap_or_else(|| "main".to_string()),
        topics: record.topics.clone(),
        created_at: record.created_at,
        updated_at: record.updated_at,
        pushed_at: record.pushed_at,
        stars: record.stargazers_count,
        forks: record.forks_count,
        collected_at: now,
        run_id: run_id.to_string(),
        dora,
        pr,
        issues,
        ci,
        security,
        commits,
        governance,
    }
}

/// Counts and artifacts of one collection pass
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub repos_total: u64,
    pub repos_scanned: u64,
    /// Never started because the rate-limit budget ran out
    pub repos_skipped: u64,
    /// Metadata unreadable, or the snapshot failed validation or writing
    pub repos_failed: u64,
    pub error_count: u64,
    pub stopped_early: bool,
    pub snapshots: Vec<RepositorySnapshot>,
    pub governance: OrgGovernanceSummary,
}

enum Outcome {
    Written(Box<RepositorySnapshot>),
    Skipped,
    Failed,
}

pub struct RepositoryCollector<S> {
    source: Arc<S>,
    rate: Arc<RateLimitContext>,
    config: CollectorConfig,
    layout: DataLayout,
    run_id: String,
}

impl<S: PageSource> RepositoryCollector<S> {
    pub fn new(
        source: Arc<S>,
        rate: Arc<RateLimitContext>,
        config: CollectorConfig,
        layout: DataLayout,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            source,
            rate,
            config,
            layout,
            run_id: run_id.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn api<'a>(&'a self, owner: &'a str, repo: &'a str) -> RepoApi<'a, S> {
        RepoApi::new(
            self.source.as_ref(),
            self.rate.as_ref(),
            self.config.fetch_limits(),
            owner,
            repo,
        )
    }

    /// Fetch every endpoint of one repository, one call at a time.
    pub async fn fetch_repository(
        &self,
        record: &RepositoryRecord,
        now: DateTime<Utc>,
    ) -> FetchedRepository {
        let api = self.api(&record.owner.login, &record.name);
        let since_30d = now - Duration::days(WINDOW_30D);
        let since_90d = now - Duration::days(WINDOW_90D);

        let releases = api.releases().await;

        let open_prs = api.pull_requests("open").await;
        let closed_prs = api.pull_requests("closed").await;
        let sample = flow::review_sample(
            closed_prs.items().unwrap_or_default(),
            now,
            self.config.review_sample_cap,
        );
        let mut reviews = Vec::with_capacity(sample.len());
        for number in sample {
            reviews.push((number, api.reviews(number).await));
        }

        let open_issues = api.issues("open", None).await;
        let recent_issues = api.issues("all", Some(since_90d)).await;

        let workflows = api.workflows().await;
        let runs = match workflows.items() {
            Some(defined) if !defined.is_empty() => Some(api.workflow_runs(since_30d).await),
            _ => None,
        };

        let commits = api.commits(since_30d).await;

        let dependabot = api.dependabot_alerts().await;
        let secret_scanning = api.secret_scanning_alerts().await;
        let code_scanning = api.code_scanning_alerts().await;
        let branch = record.default_branch.as_deref().unwrap_or("main");
        let branch_protection = api.branch_protection(branch).await;
        let security_policy = api
            .first_existing_file(&security::SECURITY_POLICY_PATHS)
            .await;

        FetchedRepository {
            releases,
            pull_requests: flow::PullRequestInputs {
                open: open_prs,
                closed: closed_prs,
                reviews,
            },
            issues: issues::IssueInputs {
                open: open_issues,
                recent: recent_issues,
            },
            ci: ci::CiInputs { workflows, runs },
            commits,
            security: security::SecurityInputs {
                dependabot,
                secret_scanning,
                code_scanning,
                branch_protection,
                security_policy,
            },
        }
    }

    /// Fetch, extract and assemble the snapshot of one repository.
    pub async fn collect_repository(&self, record: &RepositoryRecord) -> RepositorySnapshot {
        let now = Utc::now();
        debug!("Collecting {}", record.full_name);
        let fetched = self.fetch_repository(record, now).await;
        let snapshot = build_snapshot(record, &fetched, now, &self.run_id, &self.config);
        for field_error in snapshot.errors() {
            warn!(
                "{}: {} left null, {}",
                record.full_name, field_error.field, field_error.reason
            );
        }
        snapshot
    }

    /// Validate and write `raw/<repo>.json`.
    pub async fn persist_snapshot(&self, snapshot: &RepositorySnapshot) -> MetricsResult<()> {
        let value = serde_json::to_value(snapshot)
            .map_err(|e| MetricsError::json(format!("snapshot {}", snapshot.name), e))?;
        schema::assert_valid(
            &value,
            REPOSITORY_SNAPSHOT,
            "repo",
            &format!("repository {}", snapshot.full_name),
        )?;
        storage::write_json(&self.layout.raw_snapshot(&snapshot.name), &value).await
    }

    /// Collect every repository the account owns.
    pub async fn collect_organization(&self, org: &str) -> MetricsResult<CollectionReport> {
        let listing =
            list_repositories(self.source.as_ref(), &self.rate, org, self.config.fetch_limits())
                .await;
        let records = match listing.response {
            ApiResponse::Success(records) => records,
            failure => {
                return Err(MetricsError::Listing {
                    account: org.to_string(),
                    reason: failure.failure_reason().unwrap_or_default(),
                });
            }
        };
        if listing.truncated {
            warn!(
                "Repository listing for '{org}' hit the page cap, {} repositories kept",
                records.len()
            );
        }
        info!("Found {} repositories for '{org}'", records.len());
        self.collect_all(org, records, 0).await
    }

    /// Collect only the named repositories of `owner`.
    pub async fn collect_named(
        &self,
        owner: &str,
        names: &[String],
    ) -> MetricsResult<CollectionReport> {
        let mut records = Vec::with_capacity(names.len());
        let mut failed = 0;
        for name in names {
            match self.api(owner, name).repository().await {
                ApiResponse::Success(record) => records.push(record),
                failure => {
                    warn!(
                        "Skipping {owner}/{name}: {}",
                        failure.failure_reason().unwrap_or_default()
                    );
                    failed += 1;
                }
            }
        }
        self.collect_all(owner, records, failed).await
    }

    async fn collect_one(&self, record: &RepositoryRecord) -> Outcome {
        if self.rate.is_exhausted() {
            info!(
                "Rate limit budget exhausted, not scheduling {}",
                record.full_name
            );
            return Outcome::Skipped;
        }

        let snapshot = self.collect_repository(record).await;
        match self.persist_snapshot(&snapshot).await {
            Ok(()) => Outcome::Written(Box::new(snapshot)),
            Err(e) => {
                error!("Not writing {}: {e}", record.full_name);
                Outcome::Failed
            }
        }
    }

    async fn collect_all(
        &self,
        org: &str,
        records: Vec<RepositoryRecord>,
        failed_before: u64,
    ) -> MetricsResult<CollectionReport> {
        let remaining = self.rate.remaining().await;
        let width = effective_concurrency(
            self.config.concurrency_limit,
            remaining,
            self.config.estimated_requests_per_repo(),
        );
        info!(
            "Collecting {} repositories with {width} workers ({remaining} requests remaining)",
            records.len()
        );

        // `buffer_unordered` keeps at most `width` repositories in flight
        let outcomes: Vec<Outcome> = stream::iter(records.iter())
            .map(|record| self.collect_one(record))
            .buffer_unordered(width)
            .collect()
            .await;

        let mut snapshots = Vec::new();
        let mut skipped = 0;
        let mut failed = failed_before;
        for outcome in outcomes {
            match outcome {
                Outcome::Written(snapshot) => snapshots.push(*snapshot),
                Outcome::Skipped => skipped += 1,
                Outcome::Failed => failed += 1,
            }
        }
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));

        let repos_total = records.len() as u64 + failed_before;
        let governance = OrgGovernanceSummary::from_snapshots(
            org,
            &self.run_id,
            Utc::now(),
            &snapshots,
            repos_total,
            skipped,
        );
        let value = serde_json::to_value(&governance)
            .map_err(|e| MetricsError::json("governance summary", e))?;
        schema::assert_valid(&value, ORG_GOVERNANCE_SUMMARY, "governance", "governance summary")?;
        storage::write_json(&self.layout.governance_summary(), &value).await?;

        let stopped_early = self.rate.is_exhausted();
        if stopped_early {
            warn!("Stopped early: {skipped} repositories skipped after the rate limit ran out");
        }

        Ok(CollectionReport {
            repos_total,
            repos_scanned: snapshots.len() as u64,
            repos_skipped: skipped,
            repos_failed: failed,
            error_count: snapshots.iter().map(|s| s.error_count() as u64).sum(),
            stopped_early,
            snapshots,
            governance,
        })
    }
}
