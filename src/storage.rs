//! On-disk layout of the data directory and JSON persistence
//!
//! ```text
//! <root>/raw/<repo>.json
//! <root>/org/governance.json
//! <root>/aggregated/dashboard.json
//! <root>/history/<YYYY-MM-DD>.json
//! <root>/runs/<run_id>.json
//! ```

use crate::error::{MetricsError, MetricsResult};
use chrono::NaiveDate;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn raw_snapshot(&self, repo: &str) -> PathBuf {
        self.raw_dir().join(format!("{}.json", file_stem(repo)))
    }

    pub fn governance_summary(&self) -> PathBuf {
        self.root.join("org").join("governance.json")
    }

    pub fn dashboard(&self) -> PathBuf {
        self.root.join("aggregated").join("dashboard.json")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.root.join("history")
    }

    pub fn history_file(&self, day: NaiveDate) -> PathBuf {
        self.history_dir()
            .join(format!("{}.json", day.format("%Y-%m-%d")))
    }

    pub fn run_metadata(&self, run_id: &str) -> PathBuf {
        self.root.join("runs").join(format!("{}.json", file_stem(run_id)))
    }
}

/// Keep names usable as file stems
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}

fn render(value: &Value, path: &Path) -> MetricsResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| MetricsError::json(path.display().to_string(), e))?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write pretty JSON through a temp file and rename, so readers never see a
/// partial file.
pub async fn write_json(path: &Path, value: &Value) -> MetricsResult<()> {
    let bytes = render(value, path)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| MetricsError::io(parent, e))?;
    }
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| MetricsError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| MetricsError::io(path, e))
}

/// Blocking counterpart of [`write_json`] for the batch aggregation stage
pub fn write_json_blocking(path: &Path, value: &Value) -> MetricsResult<()> {
    let bytes = render(value, path)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MetricsError::io(parent, e))?;
    }
    let tmp = temp_path(path);
    std::fs::write(&tmp, bytes).map_err(|e| MetricsError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| MetricsError::io(path, e))
}

pub fn read_json(path: &Path) -> MetricsResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| MetricsError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| MetricsError::json(path.display().to_string(), e))
}

/// `*.json` files directly inside `dir`, sorted by path. A missing directory
/// yields nothing.
pub fn json_files(dir: &Path) -> MetricsResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            MetricsError::io(path, std::io::Error::other(e.to_string()))
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}
