//! REST endpoints read by the collector
//!
//! Each method builds the route and query for one endpoint and goes through
//! the shared fetcher, so every call is budgeted, time-bounded and classified.

use crate::github::error::ApiResponse;
use crate::github::pagination::{FetchLimits, PageSet, PageSource, fetch_object, fetch_pages};
use crate::github::rate_limiter::RateLimitContext;
use crate::github::records::{
    CodeScanningAlert, Commit, DependabotAlert, Issue, PullRequest, Release, RepositoryRecord,
    Review, SecretScanningAlert, Workflow, WorkflowRun,
};
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use serde_json::Value;

fn params(pairs: &[(&str, String)]) -> Vec<(String, String)> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// List every repository of an organization, falling back to the user
/// endpoint when the account is not an organization.
pub async fn list_repositories<S: PageSource>(
    source: &S,
    rate: &RateLimitContext,
    account: &str,
    limits: FetchLimits,
) -> PageSet<RepositoryRecord> {
    let org_route = format!("/orgs/{account}/repos");
    let org_query = params(&[("type", "all".to_string()), ("sort", "updated".to_string())]);
    let repos = fetch_pages(source, rate, &org_route, &org_query, limits).await;

    if let ApiResponse::NotFound(_) = repos.response {
        info!("'{account}' is not an organization, listing user repositories instead");
        let user_route = format!("/users/{account}/repos");
        let user_query = params(&[("type", "owner".to_string()), ("sort", "updated".to_string())]);
        return fetch_pages(source, rate, &user_route, &user_query, limits)
            .await
            .decode();
    }

    repos.decode()
}

/// Endpoint accessor bound to one repository
pub struct RepoApi<'a, S> {
    source: &'a S,
    rate: &'a RateLimitContext,
    limits: FetchLimits,
    owner: &'a str,
    repo: &'a str,
}

impl<'a, S: PageSource> RepoApi<'a, S> {
    pub fn new(
        source: &'a S,
        rate: &'a RateLimitContext,
        limits: FetchLimits,
        owner: &'a str,
        repo: &'a str,
    ) -> Self {
        Self {
            source,
            rate,
            limits,
            owner,
            repo,
        }
    }

    fn route(&self, tail: &str) -> String {
        format!("/repos/{}/{}{tail}", self.owner, self.repo)
    }

    async fn list(&self, tail: &str, query: &[(&str, String)]) -> PageSet<Value> {
        fetch_pages(
            self.source,
            self.rate,
            &self.route(tail),
            &params(query),
            self.limits,
        )
        .await
    }

    async fn object(&self, tail: &str) -> ApiResponse<Value> {
        fetch_object(
            self.source,
            self.rate,
            &self.route(tail),
            &[],
            self.limits.timeout,
        )
        .await
    }

    pub async fn repository(&self) -> ApiResponse<RepositoryRecord> {
        self.object("")
            .await
            .and_then(|body| match serde_json::from_value(body) {
                Ok(record) => ApiResponse::Success(record),
                Err(e) => ApiResponse::Transient(format!("malformed repository record: {e}")),
            })
    }

    pub async fn releases(&self) -> PageSet<Release> {
        self.list("/releases", &[]).await.decode()
    }

    /// Pull requests in `state`, most recently updated first
    pub async fn pull_requests(&self, state: &str) -> PageSet<PullRequest> {
        self.list(
            "/pulls",
            &[
                ("state", state.to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
            ],
        )
        .await
        .decode()
    }

    pub async fn reviews(&self, pr_number: u64) -> PageSet<Review> {
        self.list(&format!("/pulls/{pr_number}/reviews"), &[])
            .await
            .decode()
    }

    /// Issues (pull requests included, as the API returns them)
    pub async fn issues(&self, state: &str, since: Option<DateTime<Utc>>) -> PageSet<Issue> {
        let mut query = vec![("state", state.to_string())];
        if let Some(since) = since {
            query.push(("since", timestamp(since)));
        }
        self.list("/issues", &query).await.decode()
    }

    pub async fn workflows(&self) -> PageSet<Workflow> {
        self.list("/actions/workflows", &[]).await.decode()
    }

    pub async fn workflow_runs(&self, created_since: DateTime<Utc>) -> PageSet<WorkflowRun> {
        self.list(
            "/actions/runs",
            &[("created", format!(">={}", created_since.format("%Y-%m-%d")))],
        )
        .await
        .decode()
    }

    pub async fn commits(&self, since: DateTime<Utc>) -> PageSet<Commit> {
        self.list("/commits", &[("since", timestamp(since))])
            .await
            .decode()
    }

    pub async fn dependabot_alerts(&self) -> PageSet<DependabotAlert> {
        self.list("/dependabot/alerts", &[("state", "all".to_string())])
            .await
            .decode()
    }

    pub async fn secret_scanning_alerts(&self) -> PageSet<SecretScanningAlert> {
        self.list("/secret-scanning/alerts", &[("state", "open".to_string())])
            .await
            .decode()
    }

    pub async fn code_scanning_alerts(&self) -> PageSet<CodeScanningAlert> {
        self.list("/code-scanning/alerts", &[("state", "open".to_string())])
            .await
            .decode()
    }

    /// Success(true) when protected, Success(false) when GitHub reports the
    /// branch as unprotected.
    pub async fn branch_protection(&self, branch: &str) -> ApiResponse<bool> {
        let tail = format!("/branches/{}/protection", urlencoding::encode(branch));
        match self.object(&tail).await {
            ApiResponse::Success(_) => ApiResponse::Success(true),
            ApiResponse::NotFound(reason) if reason.contains("not protected") => {
                ApiResponse::Success(false)
            }
            other => other.map(|_| false),
        }
    }

    /// Probe the contents API for the first existing path.
    pub async fn first_existing_file(&self, paths: &[&str]) -> ApiResponse<Option<String>> {
        for path in paths {
            match self.object(&format!("/contents/{path}")).await {
                ApiResponse::Success(_) => return ApiResponse::Success(Some(path.to_string())),
                ApiResponse::NotFound(_) => continue,
                other => return other.map(|_| None),
            }
        }
        ApiResponse::Success(None)
    }
}
