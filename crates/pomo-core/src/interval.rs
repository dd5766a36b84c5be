//! Interval creation and the start/pause operations.

use std::future::Future;

use chrono::Utc;

use crate::category::next_category;
use crate::config::IntervalConfig;
use crate::error::Error;
use crate::machine::{self, Command, Outcome};
use crate::ticker::{self, Callbacks, Control};
use crate::types::Interval;

/// Returns the active interval, creating a new one if there is none.
///
/// An interval is active while it is not done or cancelled. Calling this
/// repeatedly without completing the interval returns the same record.
pub fn get_interval(config: &IntervalConfig) -> Result<Interval, Error> {
    match config.repo().last() {
        Ok(last) if last.is_active() => Ok(last),
        Ok(_) | Err(Error::NoIntervals) => new_interval(config),
        Err(err) => Err(err),
    }
}

/// Creates and persists the next interval in the cycle.
fn new_interval(config: &IntervalConfig) -> Result<Interval, Error> {
    let category = next_category(config.repo())?;
    let mut interval = Interval::draft(category, config.duration_for(category));
    interval.id = config.repo().create(&interval)?;

    tracing::info!(
        id = %interval.id,
        %category,
        planned = ?interval.planned_duration,
        "created interval"
    );
    Ok(interval)
}

impl Interval {
    /// Starts or resumes the interval and runs it until it stops.
    ///
    /// Resolves once the interval completes, is paused through [`Interval::pause`],
    /// or `cancel` resolves. Completion of `cancel` marks the interval cancelled.
    /// Starting an interval that is already running returns
    /// [`Outcome::AlreadyRunning`] without touching it.
    pub async fn start<C, F>(
        &self,
        config: &IntervalConfig,
        callbacks: &mut C,
        cancel: F,
    ) -> Result<Outcome, Error>
    where
        C: Callbacks + ?Sized,
        F: Future<Output = ()>,
    {
        let transition = machine::decide(self, Command::Start { now: Utc::now() })?;
        match ticker::apply(&transition, config.repo(), callbacks)? {
            Control::RunTicker => {
                tracing::debug!(id = %self.id, category = %self.category, "interval running");
                ticker::run(self.id, config, callbacks, cancel).await
            }
            Control::Finish(outcome) => Ok(outcome),
            // Start transitions always end in RunTicker or Finish.
            Control::Continue => Err(Error::InvalidState(transition.interval.state.code())),
        }
    }

    /// Pauses a running interval.
    ///
    /// Only the persisted state changes; a running tick loop notices it on its
    /// next tick and returns [`Outcome::Paused`].
    pub fn pause(&self, config: &IntervalConfig) -> Result<(), Error> {
        let transition = machine::decide(self, Command::Pause)?;
        ticker::apply(&transition, config.repo(), &mut ())?;
        tracing::debug!(id = %self.id, actual = ?self.actual_duration, "interval paused");
        Ok(())
    }
}
