//! Date-keyed dashboard history
//!
//! One file per calendar day. Saving twice on the same day overwrites that
//! day's file.

use crate::aggregate::types::AggregatedDashboard;
use crate::error::{MetricsError, MetricsResult};
use crate::schema::{self, AGGREGATED_DASHBOARD};
use crate::storage::{self, DataLayout};
use chrono::NaiveDate;
use log::debug;
use serde_json::Value;
use std::path::PathBuf;

pub struct HistoryStore {
    layout: DataLayout,
}

impl HistoryStore {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// Days with a stored snapshot, oldest first. Files whose stem is not a
    /// date are ignored.
    pub fn days(&self) -> MetricsResult<Vec<(NaiveDate, PathBuf)>> {
        let mut days: Vec<(NaiveDate, PathBuf)> = storage::json_files(&self.layout.history_dir())?
            .into_iter()
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?;
                let day = NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()?;
                Some((day, path))
            })
            .collect();
        days.sort_by_key(|(day, _)| *day);
        Ok(days)
    }

    /// Latest snapshot dated strictly before `day`, validated and decoded.
    pub fn previous(&self, day: NaiveDate) -> MetricsResult<Option<(NaiveDate, AggregatedDashboard)>> {
        let Some((found, path)) = self.days()?.into_iter().rev().find(|(d, _)| *d < day) else {
            debug!("No history snapshot before {day}");
            return Ok(None);
        };
        let value = storage::read_json(&path)?;
        schema::assert_valid(
            &value,
            AGGREGATED_DASHBOARD,
            "history",
            &format!("history snapshot {found}"),
        )?;
        let dashboard = serde_json::from_value(value)
            .map_err(|e| MetricsError::json(path.display().to_string(), e))?;
        Ok(Some((found, dashboard)))
    }

    /// Store `dashboard` as the snapshot of `day`.
    pub fn save(&self, day: NaiveDate, dashboard: &Value) -> MetricsResult<PathBuf> {
        let path = self.layout.history_file(day);
        storage::write_json_blocking(&path, dashboard)?;
        Ok(path)
    }
}
