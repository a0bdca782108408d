//! Crate-level error type

use crate::github::GitHubError;
use crate::schema::SchemaError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    /// Missing or unparsable settings, raised before any network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// An artifact failed its schema contract
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// The repository listing itself failed, so there is nothing to collect
    #[error("Failed to list repositories for '{account}': {reason}")]
    Listing { account: String, reason: String },

    #[error("No repository snapshots found in {}", .0.display())]
    NoSnapshots(PathBuf),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

impl MetricsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MetricsError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        MetricsError::Json {
            context: context.into(),
            source,
        }
    }
}
