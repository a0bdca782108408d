//! Bounded, page-capped GET sequences
//!
//! `fetch_pages` walks `page=1..` of a list endpoint until the API reports
//! exhaustion or the page cap is hit, and classifies every failure into an
//! [`ApiResponse`] variant. A failure on any page empties the whole result.

use crate::github::error::ApiResponse;
use crate::github::rate_limiter::RateLimitContext;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Object keys that hold the list in wrapped list responses
const LIST_KEYS: [&str; 4] = ["workflow_runs", "workflows", "items", "artifacts"];

/// Rate-limit figures observed on a response
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateObservation {
    pub remaining: u32,
    pub reset_time: DateTime<Utc>,
}

/// Decoded body of one HTTP response
#[derive(Clone, Debug)]
pub struct HttpPage {
    pub body: Value,
    /// Whether the `Link` header advertised a `rel="next"` page
    pub has_next: bool,
    pub rate: Option<RateObservation>,
}

/// Transport seam for GET requests against the API.
///
/// The octocrab-backed [`GitHubClient`](crate::GitHubClient) is the production
/// implementation; tests substitute in-memory sources.
pub trait PageSource: Send + Sync {
    /// Perform exactly one GET. `route` is an API path such as `/repos/o/r/pulls`.
    fn get(
        &self,
        route: &str,
        query: &[(String, String)],
    ) -> impl Future<Output = ApiResponse<HttpPage>> + Send;
}

/// Per-call limits
#[derive(Clone, Copy, Debug)]
pub struct FetchLimits {
    pub max_pages: u32,
    pub per_page: u8,
    pub timeout: Duration,
}

/// Result of a paginated query
#[derive(Clone, Debug)]
pub struct PageSet<T> {
    pub response: ApiResponse<Vec<T>>,
    /// The page cap was reached while more pages remained
    pub truncated: bool,
}

impl<T> PageSet<T> {
    pub fn success(items: Vec<T>, truncated: bool) -> Self {
        Self {
            response: ApiResponse::Success(items),
            truncated,
        }
    }

    pub fn failed(response: ApiResponse<Vec<T>>) -> Self {
        Self {
            response,
            truncated: false,
        }
    }

    pub fn items(&self) -> Option<&[T]> {
        self.response.as_success().map(Vec::as_slice)
    }
}

impl PageSet<Value> {
    /// Decode raw records into typed ones. A record that does not decode turns
    /// the set into a transient failure rather than being dropped.
    pub fn decode<T: DeserializeOwned>(self) -> PageSet<T> {
        let truncated = self.truncated;
        let response = match self.response {
            ApiResponse::Success(items) => {
                let decoded: Result<Vec<T>, _> =
                    items.into_iter().map(serde_json::from_value).collect();
                match decoded {
                    Ok(records) => ApiResponse::Success(records),
                    Err(e) => {
                        return PageSet::failed(ApiResponse::Transient(format!(
                            "malformed record: {e}"
                        )));
                    }
                }
            }
            other => other.map(|_| Vec::new()),
        };
        PageSet {
            response,
            truncated,
        }
    }
}

/// Fetch one page through the budget and timeout.
async fn get_through_budget<S: PageSource>(
    source: &S,
    rate: &RateLimitContext,
    route: &str,
    query: &[(String, String)],
    timeout: Duration,
) -> ApiResponse<HttpPage> {
    if let Err(e) = rate.acquire().await {
        return ApiResponse::Transient(e.to_string());
    }

    let response = match tokio::time::timeout(timeout, source.get(route, query)).await {
        Ok(response) => response,
        Err(_) => {
            return ApiResponse::Transient(format!("{route} timed out after {timeout:?}"));
        }
    };

    match &response {
        ApiResponse::Success(page) => {
            if let Some(obs) = page.rate {
                rate.update(obs.remaining, obs.reset_time).await;
            }
        }
        ApiResponse::Transient(reason) if crate::github::error::is_rate_limit_message(reason) => {
            rate.mark_exhausted();
        }
        _ => {}
    }

    response
}

/// Pull the record list out of a response body.
fn extract_items(body: Value) -> Result<Vec<Value>, String> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => LIST_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| "response object carries no record list".to_string()),
        other => Err(format!("unexpected response body: {other}")),
    }
}

/// Walk a list endpoint page by page.
pub async fn fetch_pages<S: PageSource>(
    source: &S,
    rate: &RateLimitContext,
    route: &str,
    query: &[(String, String)],
    limits: FetchLimits,
) -> PageSet<Value> {
    let mut items = Vec::new();
    let max_pages = limits.max_pages.max(1);

    for page in 1..=max_pages {
        let mut params = query.to_vec();
        params.push(("per_page".to_string(), limits.per_page.to_string()));
        params.push(("page".to_string(), page.to_string()));

        let http_page = match get_through_budget(source, rate, route, &params, limits.timeout).await
        {
            ApiResponse::Success(p) => p,
            failure => {
                warn!(
                    "{route} page {page} failed: {}",
                    failure.failure_reason().unwrap_or_default()
                );
                return PageSet::failed(failure.map(|_| Vec::new()));
            }
        };

        let has_next = http_page.has_next;
        let batch = match extract_items(http_page.body) {
            Ok(batch) => batch,
            Err(reason) => {
                return PageSet::failed(ApiResponse::Transient(format!("{route}: {reason}")));
            }
        };

        let exhausted = batch.is_empty() || batch.len() < limits.per_page as usize || !has_next;
        items.extend(batch);

        if exhausted {
            debug!("{route}: exhausted after {page} page(s), {} records", items.len());
            return PageSet::success(items, false);
        }
    }

    debug!("{route}: page cap {max_pages} reached, {} records kept", items.len());
    PageSet::success(items, true)
}

/// GET a single-object endpoint.
pub async fn fetch_object<S: PageSource>(
    source: &S,
    rate: &RateLimitContext,
    route: &str,
    query: &[(String, String)],
    timeout: Duration,
) -> ApiResponse<Value> {
    get_through_budget(source, rate, route, query, timeout)
        .await
        .map(|page| page.body)
}
