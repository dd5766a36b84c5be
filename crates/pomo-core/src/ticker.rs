//! The tick loop that drives a running interval.
//!
//! Each cycle races three signals: the one-second ticker, the completion
//! deadline and the caller's cancellation future. Whichever is ready first is
//! turned into a [`Command`]; when several are ready, cancellation wins over the
//! deadline and the deadline over a pending tick. The record is then re-read
//! from the repository and the resulting [`Transition`] is executed. No state
//! is carried across a suspension point except the interval ID.

use std::future::Future;

use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::IntervalConfig;
use crate::error::Error;
use crate::machine::{self, Command, Effect, Outcome, TICK, Transition};
use crate::repository::Repository;
use crate::types::{Interval, IntervalId};

/// Progress notifications invoked from the tick loop.
///
/// Callbacks run on the loop's own task; a slow callback delays the next tick.
pub trait Callbacks {
    /// Called once, before the first tick.
    fn on_start(&mut self, _interval: &Interval) {}
    /// Called after every completed second before the deadline.
    fn on_tick(&mut self, _interval: &Interval) {}
    /// Called once when the interval runs to completion, with the full duration.
    fn on_end(&mut self, _interval: &Interval) {}
}

impl Callbacks for () {}

/// [`Callbacks`] built from three closures.
pub struct FnCallbacks<S, T, E> {
    pub start: S,
    pub tick: T,
    pub end: E,
}

impl<S, T, E> Callbacks for FnCallbacks<S, T, E>
where
    S: FnMut(&Interval),
    T: FnMut(&Interval),
    E: FnMut(&Interval),
{
    fn on_start(&mut self, interval: &Interval) {
        (self.start)(interval);
    }

    fn on_tick(&mut self, interval: &Interval) {
        (self.tick)(interval);
    }

    fn on_end(&mut self, interval: &Interval) {
        (self.end)(interval);
    }
}

/// What the caller should do after a transition's effects have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Continue,
    RunTicker,
    Finish(Outcome),
}

/// Executes the effects of `transition` in order.
pub(crate) fn apply<C: Callbacks + ?Sized>(
    transition: &Transition,
    repo: &dyn Repository,
    callbacks: &mut C,
) -> Result<Control, Error> {
    let interval = &transition.interval;
    for effect in &transition.effects {
        match *effect {
            Effect::Persist => repo.update(interval)?,
            Effect::NotifyTick => callbacks.on_tick(interval),
            Effect::NotifyEnd => callbacks.on_end(interval),
            Effect::RunTicker => return Ok(Control::RunTicker),
            Effect::Finish(outcome) => return Ok(Control::Finish(outcome)),
        }
    }
    Ok(Control::Continue)
}

/// Runs the loop for interval `id` until it completes, pauses or is cancelled.
///
/// The completion deadline is the interval's remaining duration at the moment
/// the loop starts, so a resumed interval only runs for the time it has left.
/// Any repository error ends the loop immediately.
pub(crate) async fn run<C, F>(
    id: IntervalId,
    config: &IntervalConfig,
    callbacks: &mut C,
    cancel: F,
) -> Result<Outcome, Error>
where
    C: Callbacks + ?Sized,
    F: Future<Output = ()>,
{
    let repo = config.repo();
    let interval = repo.by_id(id)?;

    let began = Instant::now();
    let expire = time::sleep_until(began + interval.remaining());
    let mut ticker = time::interval_at(began + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(expire);
    tokio::pin!(cancel);

    tracing::debug!(%id, remaining = ?interval.remaining(), "tick loop started");
    callbacks.on_start(&interval);

    loop {
        let command = tokio::select! {
            biased;
            () = &mut cancel => Command::Cancel,
            () = &mut expire => Command::Expire,
            _ = ticker.tick() => Command::Tick,
        };

        match step(id, repo, command, callbacks) {
            Ok(Control::Finish(outcome)) => {
                tracing::info!(%id, ?outcome, "tick loop finished");
                return Ok(outcome);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%id, ?command, error = %err, "tick loop aborted");
                return Err(err);
            }
        }
    }
}

fn step<C: Callbacks + ?Sized>(
    id: IntervalId,
    repo: &dyn Repository,
    command: Command,
    callbacks: &mut C,
) -> Result<Control, Error> {
    let current = repo.by_id(id)?;
    let transition = machine::decide(&current, command)?;
    tracing::debug!(
        %id,
        ?command,
        state = %transition.interval.state,
        actual = ?transition.interval.actual_duration,
        "tick loop step"
    );
    apply(&transition, repo, callbacks)
}
