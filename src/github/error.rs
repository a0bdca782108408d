//! GitHub API error types and the classified outcome of a single call

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for GitHub client setup and budget handling
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Octocrab library error
    #[error("Octocrab error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// Client setup/configuration error
    #[error("Client setup failed: {0}")]
    ClientSetup(String),

    /// Rate limit budget is spent and the reset is too far away to wait for
    #[error("Rate limit exhausted. Remaining: {remaining}, Reset time: {reset_time}")]
    RateLimitExhausted {
        remaining: u32,
        reset_time: DateTime<Utc>,
    },

    /// Generic GitHub API error
    #[error("GitHub API error: {0}")]
    Api(String),
}

/// Convenience result alias for GitHub operations
pub type GitHubResult<T> = Result<T, GitHubError>;

impl From<String> for GitHubError {
    fn from(s: String) -> Self {
        GitHubError::Api(s)
    }
}

/// Outcome of one GitHub call, classified once at the fetcher boundary.
///
/// Downstream code matches on this exhaustively instead of inspecting
/// status codes.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Success(T),
    /// Endpoint exists but the token lacks scope or the feature is not granted
    PermissionDenied(String),
    /// Endpoint or feature is disabled or absent
    NotFound(String),
    /// Timeout, 5xx, network or decoding failure
    Transient(String),
}

impl<T> ApiResponse<T> {
    /// Classify an HTTP status. Returns `None` for 2xx.
    pub fn from_status(status: u16, message: &str) -> Option<Self> {
        let reason = if message.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {message}")
        };
        match status {
            200..=299 => None,
            403 | 429 if is_rate_limit_message(message) => Some(ApiResponse::Transient(reason)),
            401 | 403 => Some(ApiResponse::PermissionDenied(reason)),
            404 | 410 => Some(ApiResponse::NotFound(reason)),
            _ => Some(ApiResponse::Transient(reason)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            ApiResponse::Success(v) => ApiResponse::Success(f(v)),
            ApiResponse::PermissionDenied(r) => ApiResponse::PermissionDenied(r),
            ApiResponse::NotFound(r) => ApiResponse::NotFound(r),
            ApiResponse::Transient(r) => ApiResponse::Transient(r),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> ApiResponse<U>) -> ApiResponse<U> {
        match self {
            ApiResponse::Success(v) => f(v),
            ApiResponse::PermissionDenied(r) => ApiResponse::PermissionDenied(r),
            ApiResponse::NotFound(r) => ApiResponse::NotFound(r),
            ApiResponse::Transient(r) => ApiResponse::Transient(r),
        }
    }

    pub fn as_success(&self) -> Option<&T> {
        match self {
            ApiResponse::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            ApiResponse::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    /// Human-readable failure reason, `None` on success.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            ApiResponse::Success(_) => None,
            ApiResponse::PermissionDenied(r) => Some(format!("permission denied ({r})")),
            ApiResponse::NotFound(r) => Some(format!("not available ({r})")),
            ApiResponse::Transient(r) => Some(format!("transient failure ({r})")),
        }
    }
}

pub(crate) fn is_rate_limit_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("rate limit")
}

/// One non-fatal failure recorded against a snapshot field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
