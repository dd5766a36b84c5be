//! Pause command for suspending the running interval.

use std::io::Write;

use anyhow::{Context, Result, bail};
use pomo_core::{Error, Repository};

use super::util::{format_clock, interval_config};
use crate::Config;

/// Pauses the most recent interval.
///
/// A `pomo start` running in another terminal notices the change on its next
/// tick and exits, keeping the time accumulated so far.
pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let (db, interval_config) = interval_config(config)?;
    let interval = match db.last() {
        Ok(interval) => interval,
        Err(Error::NoIntervals) => bail!("no interval to pause"),
        Err(err) => return Err(err).context("failed to read current interval"),
    };

    interval
        .pause(&interval_config)
        .with_context(|| format!("cannot pause {} #{}", interval.category, interval.id))?;

    writeln!(
        writer,
        "Paused {} #{} at {} left",
        interval.category,
        interval.id,
        format_clock(interval.remaining())
    )?;
    Ok(())
}
