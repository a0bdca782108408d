//! `org_metrics` - organization engineering metrics from the GitHub REST API
//!
//! The crate collects per-repository delivery, flow, CI, security and
//! governance signals, persists them as schema-checked snapshots, and rolls
//! them into an organization dashboard with DORA bands and a vulnerability
//! trend against the previous day's history.
//!
//! Missing or forbidden data stays `null` end to end; it is never reported as
//! zero.

// Module declarations
pub mod aggregate;
pub mod collector;
pub mod config;
pub mod error;
pub mod github;
pub mod run;
pub mod schema;
pub mod stats;
pub mod storage;

// Re-export GitHub client types
pub use github::{GitHubClient, GitHubClientBuilder};

// Re-export error types
pub use error::{MetricsError, MetricsResult};
pub use github::{ApiResponse, GitHubError, GitHubResult};

pub use aggregate::{AggregateContext, AggregatedDashboard, Aggregator, aggregate};
pub use collector::{CollectionReport, OrgGovernanceSummary, RepositoryCollector, RepositorySnapshot};
pub use config::{CollectorConfig, Settings};
pub use run::{RunMetadata, RunRecorder};
pub use schema::SchemaError;
pub use storage::DataLayout;
