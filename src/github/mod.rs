//! GitHub REST access
//!
//! Transport, pagination, rate-limit budget and the endpoints the collector
//! reads. Nothing here computes metrics.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod pagination;
pub mod rate_limiter;
pub mod records;

// Re-export client types
pub use client::{GitHubClient, GitHubClientBuilder};

// Re-export error types
pub use error::{ApiResponse, FieldError, GitHubError, GitHubResult};

pub use pagination::{FetchLimits, HttpPage, PageSet, PageSource, RateObservation};
pub use rate_limiter::{RateLimitContext, RateLimitSnapshot};
