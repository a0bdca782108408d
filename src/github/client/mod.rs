//! GitHub API client wrapper
//!
//! Provides the read-only transport used by the collector without exposing
//! Octocrab to the rest of the crate.
//!
//! # Examples
//!
//! ```rust,no_run
//! use org_metrics::GitHubClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gh = GitHubClient::with_token("ghp_...")?;
//!     let quota = gh.rate_limit().await?;
//!     println!("{} requests left", quota.remaining);
//!     Ok(())
//! }
//! ```

use crate::github::error::{GitHubError, GitHubResult};
use crate::github::pagination::RateObservation;
use chrono::DateTime;
use octocrab::Octocrab;
use octocrab::service::middleware::retry::RetryConfig;
use std::sync::Arc;

mod transport;

/// GitHub API client wrapper that encapsulates Octocrab.
///
/// Cloning is cheap (Arc clone).
#[derive(Clone, Debug)]
pub struct GitHubClient {
    inner: Arc<Octocrab>,
}

impl GitHubClient {
    /// Create a new client builder
    #[must_use]
    pub fn builder() -> GitHubClientBuilder {
        GitHubClientBuilder::new()
    }

    /// Convenience: create client with personal access token
    pub fn with_token(token: impl Into<String>) -> GitHubResult<Self> {
        Self::builder().personal_token(token).build()
    }

    /// Get inner Octocrab client
    #[must_use]
    pub fn inner(&self) -> &Arc<Octocrab> {
        &self.inner
    }

    /// Current core-API quota, used to seed the run's rate-limit context
    pub async fn rate_limit(&self) -> GitHubResult<RateObservation> {
        let rate_limit = self.inner.ratelimit().get().await?;
        let core = rate_limit.resources.core;
        let reset_time = DateTime::from_timestamp(core.reset as i64, 0)
            .unwrap_or_else(|| chrono::Utc::now() + chrono::Duration::hours(1));

        Ok(RateObservation {
            remaining: core.remaining as u32,
            reset_time,
        })
    }
}

/// Builder for creating `GitHubClient`
pub struct GitHubClientBuilder {
    token: Option<String>,
    base_uri: Option<String>,
}

impl GitHubClientBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: None,
            base_uri: None,
        }
    }

    /// Set personal access token for authentication
    pub fn personal_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set base URI (for GitHub Enterprise)
    pub fn base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    /// Build the `GitHubClient`
    ///
    /// Octocrab's retry middleware is switched off: every request is sent once
    /// and its outcome classified by the caller, so a 5xx or 429 costs exactly
    /// one unit of the run's request budget.
    pub fn build(self) -> GitHubResult<GitHubClient> {
        let mut builder = Octocrab::builder().add_retry_config(RetryConfig::None);

        if let Some(token) = self.token {
            builder = builder.personal_token(token);
        }

        if let Some(uri) = self.base_uri {
            builder = builder
                .base_uri(&uri)
                .map_err(|e| GitHubError::ClientSetup(e.to_string()))?;
        }

        let octocrab = builder
            .build()
            .map_err(|e| GitHubError::ClientSetup(e.to_string()))?;

        Ok(GitHubClient {
            inner: Arc::new(octocrab),
        })
    }
}

impl Default for GitHubClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
