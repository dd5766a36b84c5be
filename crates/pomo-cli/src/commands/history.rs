//! History command for listing recent intervals.

use std::fmt::Display;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use pomo_core::{Category, Interval, IntervalId, State};
use serde::Serialize;

use super::util::{format_progress, open_database};
use crate::Config;

/// One interval as written by `history --json`.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: IntervalId,
    pub category: Category,
    pub state: String,
    pub start_time: Option<DateTime<Utc>>,
    pub planned_secs: u64,
    pub actual_secs: u64,
}

impl From<&Interval> for HistoryEntry {
    fn from(interval: &Interval) -> Self {
        Self {
            id: interval.id,
            category: interval.category,
            state: state_name(interval.state).to_string(),
            start_time: interval.start_time,
            planned_secs: interval.planned_duration.as_secs(),
            actual_secs: interval.actual_duration.as_secs(),
        }
    }
}

const fn state_name(state: State) -> &'static str {
    match state {
        State::NotStarted => "not_started",
        State::Running => "running",
        State::Paused => "paused",
        State::Done => "done",
        State::Cancelled => "cancelled",
    }
}

/// Formats intervals as aligned text, newest first, with start times in `tz`.
pub fn format_history<Tz>(intervals: &[Interval], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut output = String::new();
    for interval in intervals {
        let started = interval.start_time.map_or_else(
            || "-".to_string(),
            |t| t.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string(),
        );
        let _ = writeln!(
            output,
            "{:<4}  {:<16}  {:<10}  {:<11}  {}",
            format!("#{}", interval.id),
            started,
            interval.category.as_str(),
            interval.state.to_string(),
            format_progress(interval)
        );
    }
    output
}

/// Formats intervals as JSON lines, newest first.
pub fn format_history_json(intervals: &[Interval]) -> Result<String> {
    let mut output = String::new();
    for interval in intervals {
        output.push_str(&serde_json::to_string(&HistoryEntry::from(interval))?);
        output.push('\n');
    }
    Ok(output)
}

/// Runs the history command.
pub fn run<W: Write>(writer: &mut W, config: &Config, limit: usize, json: bool) -> Result<()> {
    let db = open_database(config)?;
    let intervals = db.recent(limit).context("failed to read interval history")?;

    if json {
        write!(writer, "{}", format_history_json(&intervals)?)?;
    } else if intervals.is_empty() {
        writeln!(writer, "No intervals recorded yet.")?;
    } else {
        write!(writer, "{}", format_history(&intervals, &Local))?;
    }
    Ok(())
}
