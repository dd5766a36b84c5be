//! Shared utilities for CLI commands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pomo_core::{Interval, IntervalConfig};
use pomo_db::Database;

use crate::Config;

/// Opens the configured database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Arc<Database>> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok(Arc::new(db))
}

/// Builds the engine configuration over the configured database.
pub fn interval_config(config: &Config) -> Result<(Arc<Database>, IntervalConfig)> {
    let db = open_database(config)?;
    let interval_config = config.interval_config(db.clone());
    Ok((db, interval_config))
}

/// Formats a duration as `mm:ss`. Minutes are not wrapped into hours.
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Formats elapsed over planned time, e.g. `07:30 / 25:00`.
pub fn format_progress(interval: &Interval) -> String {
    format!(
        "{} / {}",
        format_clock(interval.actual_duration),
        format_clock(interval.planned_duration)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(Duration::ZERO), "00:00");
        assert_eq!(format_clock(Duration::from_secs(65)), "01:05");
        assert_eq!(format_clock(Duration::from_secs(25 * 60)), "25:00");
        assert_eq!(format_clock(Duration::from_secs(2 * 3600 + 1)), "120:01");
    }

    #[test]
    fn format_clock_truncates_subseconds() {
        assert_eq!(format_clock(Duration::from_millis(1999)), "00:01");
    }
}
