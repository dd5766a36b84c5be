//! Summary command for today's time per category.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use pomo_db::CategoryTotal;

use super::util::{format_clock, open_database};
use crate::Config;

/// Converts a local date at midnight to UTC.
/// Handles DST ambiguity by picking the earlier time.
fn local_midnight_to_utc(local_date: NaiveDate) -> DateTime<Utc> {
    let midnight = local_date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        // Midnight skipped by a DST change: count from midnight UTC instead
        .map_or_else(|| midnight.and_utc(), |dt| dt.with_timezone(&Utc))
}

/// Formats per-category totals, one category per line.
pub fn format_summary(totals: &[CategoryTotal]) -> String {
    if totals.is_empty() {
        return "Nothing recorded today.\n".to_string();
    }

    let mut output = String::new();
    for total in totals {
        let noun = if total.intervals == 1 {
            "interval"
        } else {
            "intervals"
        };
        let _ = writeln!(
            output,
            "{:<10}  {:>3} {:<9}  {}",
            total.category.as_str(),
            total.intervals,
            noun,
            format_clock(total.total)
        );
    }
    output
}

/// Runs the summary command.
pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let since = local_midnight_to_utc(Local::now().date_naive());
    run_since(writer, config, since)
}

/// Writes totals for intervals started at or after `since`.
pub fn run_since<W: Write>(writer: &mut W, config: &Config, since: DateTime<Utc>) -> Result<()> {
    let db = open_database(config)?;
    let totals = db
        .category_summary(since)
        .context("failed to summarize intervals")?;
    write!(writer, "{}", format_summary(&totals))?;
    Ok(())
}
