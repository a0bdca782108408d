//! Raw GET transport over Octocrab

use super::GitHubClient;
use crate::github::error::ApiResponse;
use crate::github::pagination::{HttpPage, PageSource, RateObservation};
use chrono::DateTime;
use serde_json::Value;

impl PageSource for GitHubClient {
    async fn get(&self, route: &str, query: &[(String, String)]) -> ApiResponse<HttpPage> {
        let uri = build_uri(route, query);

        // `_get` hands back the raw response so the status can be classified here
        let response = match self.inner._get(uri.as_str()).await {
            Ok(response) => response,
            Err(e) => return ApiResponse::Transient(format!("{route}: {e}")),
        };

        let status = response.status().as_u16();
        let headers = response.headers();
        let has_next = headers
            .get("link")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|link| link.contains("rel=\"next\""));
        let rate = rate_observation(
            headers
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok()),
            headers.get("x-ratelimit-reset").and_then(|v| v.to_str().ok()),
        );

        let text = match self.inner.body_to_string(response).await {
            Ok(text) => text,
            Err(e) => return ApiResponse::Transient(format!("{route}: unreadable body: {e}")),
        };

        if let Some(failure) = ApiResponse::from_status(status, &error_message(&text)) {
            return failure;
        }

        // 204 and friends carry no body
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(body) => body,
                Err(e) => return ApiResponse::Transient(format!("{route}: invalid JSON: {e}")),
            }
        };

        ApiResponse::Success(HttpPage {
            body,
            has_next,
            rate,
        })
    }
}

fn build_uri(route: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return route.to_string();
    }
    let params = query
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{route}?{params}")
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

fn rate_observation(remaining: Option<&str>, reset: Option<&str>) -> Option<RateObservation> {
    let remaining = remaining?.parse::<u32>().ok()?;
    let reset = reset?.parse::<i64>().ok()?;
    Some(RateObservation {
        remaining,
        reset_time: DateTime::from_timestamp(reset, 0)?,
    })
}
