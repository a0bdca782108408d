//! Minimal wire records decoded from GitHub REST responses
//!
//! Only the fields the extractors read are declared; everything else in the
//! payload is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Deserialize)]
pub struct Account {
    pub login: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LicenseRef {
    pub spdx_id: Option<String>,
}

/// `GET /repos/{owner}/{repo}` and entries of `GET /orgs/{org}/repos`
#[derive(Clone, Debug, Deserialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub owner: Account,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub license: Option<LicenseRef>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
}

impl RepositoryRecord {
    /// SPDX identifier, with GitHub's `NOASSERTION` placeholder treated as absent
    pub fn spdx_license(&self) -> Option<String> {
        self.license
            .as_ref()
            .and_then(|l| l.spdx_id.clone())
            .filter(|id| !id.is_empty() && id != "NOASSERTION")
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Release {
    pub fn released_at(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.created_at)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Review {
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Present when the "issue" is really a pull request
    #[serde(default)]
    pub pull_request: Option<Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub state: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorkflowRun {
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub run_started_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommitAuthorDetail {
    pub date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommitDetail {
    pub author: Option<CommitAuthorDetail>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub author: Option<Account>,
    pub commit: CommitDetail,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Advisory {
    pub severity: Option<String>,
}

/// Entry of `GET /repos/{owner}/{repo}/dependabot/alerts`
#[derive(Clone, Debug, Deserialize)]
pub struct DependabotAlert {
    pub state: String,
    pub security_advisory: Option<Advisory>,
    pub security_vulnerability: Option<Advisory>,
    pub created_at: Option<DateTime<Utc>>,
    pub fixed_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    /// Set instead of `dismissed_at` when an auto-triage rule closed the alert
    pub auto_dismissed_at: Option<DateTime<Utc>>,
}

impl DependabotAlert {
    pub fn severity(&self) -> Option<String> {
        self.security_advisory
            .as_ref()
            .and_then(|a| a.severity.clone())
            .or_else(|| {
                self.security_vulnerability
                    .as_ref()
                    .and_then(|v| v.severity.clone())
            })
            .map(|s| s.to_ascii_lowercase())
    }

    /// When the alert stopped being open: fixed, else dismissed by hand or by
    /// a triage rule, else never.
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.fixed_at
            .or(self.dismissed_at)
            .or(self.auto_dismissed_at)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SecretScanningAlert {
    pub state: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CodeScanningRule {
    pub security_severity_level: Option<String>,
    pub severity: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CodeScanningAlert {
    pub state: String,
    pub rule: Option<CodeScanningRule>,
}

impl CodeScanningAlert {
    pub fn is_critical(&self) -> bool {
        self.rule
            .as_ref()
            .and_then(|r| r.security_severity_level.as_deref())
            .is_some_and(|level| level.eq_ignore_ascii_case("critical"))
    }
}
