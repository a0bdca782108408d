//! Collector configuration and environment settings

use crate::collector::security::SECURITY_POLICY_PATHS;
use crate::error::{MetricsError, MetricsResult};
use crate::github::pagination::FetchLimits;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Paginated endpoints fetched for every repository: releases, open and
/// closed pull requests, open and recent issues, workflows, workflow runs,
/// commits and the three alert lists
const LIST_ENDPOINTS_PER_REPO: u32 = 11;

/// Tunables for one collection run
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub concurrency_limit: usize,
    pub max_pages: u32,
    pub api_page_size: u8,
    pub api_timeout: Duration,
    pub rate_limit_buffer: u32,
    pub max_rate_wait: Duration,
    pub review_sample_cap: usize,
    pub duration_sample_cap: usize,
    pub top_contributors: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 4,
            max_pages: 10,
            api_page_size: 100, // GitHub API max
            api_timeout: Duration::from_secs(30),
            rate_limit_buffer: 100,
            max_rate_wait: Duration::from_secs(300),
            review_sample_cap: 20,
            duration_sample_cap: 50,
            top_contributors: 10,
        }
    }
}

impl CollectorConfig {
    pub fn fetch_limits(&self) -> FetchLimits {
        FetchLimits {
            max_pages: self.max_pages,
            per_page: self.api_page_size,
            timeout: self.api_timeout,
        }
    }

    /// Requests one repository can cost, used to size the worker pool.
    ///
    /// Every list endpoint may walk `max_pages` pages; sampled review lists
    /// are counted as one page each.
    pub fn estimated_requests_per_repo(&self) -> u32 {
        let lists = LIST_ENDPOINTS_PER_REPO * self.max_pages.max(1);
        let lookups = 1 + SECURITY_POLICY_PATHS.len() as u32;
        lists + lookups + self.review_sample_cap as u32
    }

    fn overlay(&mut self, file: FileConfig) {
        if let Some(v) = file.concurrency_limit {
            self.concurrency_limit = v;
        }
        if let Some(v) = file.max_pages {
            self.max_pages = v;
        }
        if let Some(v) = file.api_page_size {
            self.api_page_size = v;
        }
        if let Some(v) = file.api_timeout_secs {
            self.api_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.rate_limit_buffer {
            self.rate_limit_buffer = v;
        }
        if let Some(v) = file.max_rate_wait_secs {
            self.max_rate_wait = Duration::from_secs(v);
        }
        if let Some(v) = file.review_sample_cap {
            self.review_sample_cap = v;
        }
        if let Some(v) = file.duration_sample_cap {
            self.duration_sample_cap = v;
        }
        if let Some(v) = file.top_contributors {
            self.top_contributors = v;
        }
    }
}

/// TOML form of [`CollectorConfig`]; every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    concurrency_limit: Option<usize>,
    max_pages: Option<u32>,
    api_page_size: Option<u8>,
    api_timeout_secs: Option<u64>,
    rate_limit_buffer: Option<u32>,
    max_rate_wait_secs: Option<u64>,
    review_sample_cap: Option<usize>,
    duration_sample_cap: Option<usize>,
    top_contributors: Option<usize>,
}

/// Everything the binary needs, resolved before any network call
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub org: String,
    pub api_url: Option<String>,
    pub data_dir: PathBuf,
    /// Restrict collection to these repository names
    pub repositories: Vec<String>,
    pub collector: CollectorConfig,
}

impl Settings {
    pub fn from_env() -> MetricsResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`, which maps a variable name to its value.
    ///
    /// Precedence is defaults, then the TOML file named by `METRICS_CONFIG`,
    /// then individual environment overrides.
    pub fn from_lookup<F>(lookup: F) -> MetricsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = lookup("GITHUB_TOKEN").ok_or_else(|| {
            MetricsError::Config(
                "GITHUB_TOKEN is not set. Export a token with repo and security_events scope"
                    .to_string(),
            )
        })?;
        let org = lookup("GITHUB_ORG").ok_or_else(|| {
            MetricsError::Config(
                "GITHUB_ORG is not set. Export the organization or user to collect".to_string(),
            )
        })?;

        let mut collector = CollectorConfig::default();
        if let Some(path) = lookup("METRICS_CONFIG") {
            let text = std::fs::read_to_string(&path).map_err(|e| {
                MetricsError::Config(format!("cannot read METRICS_CONFIG file '{path}': {e}"))
            })?;
            let file: FileConfig = toml::from_str(&text).map_err(|e| {
                MetricsError::Config(format!("invalid METRICS_CONFIG file '{path}': {e}"))
            })?;
            collector.overlay(file);
        }

        if let Some(v) = parse_override::<u32>(&lookup, "METRICS_MAX_PAGES")? {
            collector.max_pages = v;
        }
        if let Some(v) = parse_override::<u64>(&lookup, "METRICS_TIMEOUT_SECS")? {
            collector.api_timeout = Duration::from_secs(v);
        }
        if let Some(v) = parse_override::<usize>(&lookup, "METRICS_CONCURRENCY")? {
            collector.concurrency_limit = v;
        }

        let repositories = lookup("METRICS_REPOS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            token,
            org,
            api_url: lookup("GITHUB_API_URL"),
            data_dir: lookup("METRICS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            repositories,
            collector,
        })
    }
}

/// Parse a positive numeric override
fn parse_override<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> MetricsResult<Option<T>>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(Some(v)),
        _ => Err(MetricsError::Config(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}
