//! Start command: runs the current interval in the foreground.

use std::future::Future;
use std::io::{self, Write};

use anyhow::{Context, Result};
use pomo_core::{Callbacks, Interval, IntervalConfig, Outcome, get_interval};

use super::util::{format_clock, interval_config};
use crate::Config;

/// Prints progress lines as the tick loop reports them.
///
/// Write errors cannot be returned from a callback, so the first one is kept
/// and reported once the interval stops.
struct Progress<'a, W: Write> {
    writer: &'a mut W,
    error: Option<io::Error>,
}

impl<W: Write> Progress<'_, W> {
    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = write_line(&mut *self.writer, args) {
            self.error = Some(err);
        }
    }
}

fn write_line<W: Write>(writer: &mut W, args: std::fmt::Arguments<'_>) -> io::Result<()> {
    writer.write_fmt(args)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

impl<W: Write> Callbacks for Progress<'_, W> {
    fn on_start(&mut self, interval: &Interval) {
        let verb = if interval.actual_duration.is_zero() {
            "Starting"
        } else {
            "Resuming"
        };
        self.line(format_args!(
            "{verb} {} #{} ({} left)",
            interval.category,
            interval.id,
            format_clock(interval.remaining())
        ));
    }

    fn on_tick(&mut self, interval: &Interval) {
        self.line(format_args!(
            "{} {} remaining",
            interval.category,
            format_clock(interval.remaining())
        ));
    }

    fn on_end(&mut self, interval: &Interval) {
        self.line(format_args!(
            "{} #{} finished\x07",
            interval.category, interval.id
        ));
    }
}

/// Runs the start command until the interval stops. Ctrl-C cancels it.
pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let (_db, interval_config) = interval_config(config)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;

    let cancel = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    runtime.block_on(run_interval(writer, &interval_config, cancel))?;
    Ok(())
}

/// Fetches the current interval and runs it, printing progress to `writer`.
pub async fn run_interval<W, F>(
    writer: &mut W,
    interval_config: &IntervalConfig,
    cancel: F,
) -> Result<Outcome>
where
    W: Write,
    F: Future<Output = ()>,
{
    let interval = get_interval(interval_config).context("failed to get current interval")?;
    let id = interval.id;

    let mut progress = Progress {
        writer: &mut *writer,
        error: None,
    };
    let outcome = interval
        .start(interval_config, &mut progress, cancel)
        .await
        .with_context(|| format!("interval #{id} stopped with an error"))?;
    if let Some(err) = progress.error {
        return Err(err).context("failed to write progress");
    }

    let latest = interval_config
        .repo()
        .by_id(id)
        .context("failed to read interval after run")?;
    match outcome {
        Outcome::Completed => {}
        Outcome::Paused => writeln!(
            writer,
            "Paused {} #{} at {} left",
            latest.category,
            id,
            format_clock(latest.remaining())
        )?,
        Outcome::Cancelled => writeln!(
            writer,
            "Cancelled {} #{} after {}",
            latest.category,
            id,
            format_clock(latest.actual_duration)
        )?,
        Outcome::AlreadyRunning => writeln!(
            writer,
            "{} #{} is already running. If no timer is active, run `pomo pause` and start again.",
            latest.category, id
        )?,
    }
    Ok(outcome)
}
