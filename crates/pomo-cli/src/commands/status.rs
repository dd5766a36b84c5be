//! Status command for showing the current interval.

use std::io::Write;

use anyhow::{Context, Result};
use pomo_core::{Error, Repository, next_category};

use super::util::{format_clock, format_progress, interval_config};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let (db, interval_config) = interval_config(config)?;

    writeln!(writer, "Pomodoro timer status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;

    match db.last() {
        Ok(interval) if interval.is_active() => {
            writeln!(
                writer,
                "Current: {} #{} ({})",
                interval.category, interval.id, interval.state
            )?;
            writeln!(writer, "Elapsed: {}", format_progress(&interval))?;
            return Ok(());
        }
        Ok(_) | Err(Error::NoIntervals) => {}
        Err(err) => return Err(err).context("failed to read current interval"),
    }

    let category = next_category(&*db).context("failed to determine next interval")?;
    writeln!(
        writer,
        "No active interval. Next: {} ({})",
        category,
        format_clock(interval_config.duration_for(category))
    )?;
    Ok(())
}
