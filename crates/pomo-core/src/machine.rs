//! Interval state machine.
//!
//! [`decide`] is a pure function: given the current record and a command it
//! returns the next record plus the side effects to perform, in order. The
//! caller executes the effects against the repository and the callbacks.
//!
//! ## State Transitions
//!
//! ```text
//! NotStarted -> Running <-> Paused -> Done
//! (NotStarted | Running | Paused) -> Cancelled
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::types::{Interval, State};

/// Length of one tick.
pub const TICK: Duration = Duration::from_secs(1);

/// An input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Begin or resume running.
    Start { now: DateTime<Utc> },
    /// Suspend a running interval.
    Pause,
    /// One second of running time elapsed.
    Tick,
    /// The completion deadline elapsed.
    Expire,
    /// The caller's cancellation signal fired.
    Cancel,
}

/// How a run of the tick loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The interval ran to its planned duration.
    Completed,
    /// The interval was paused; it can be started again.
    Paused,
    /// The interval was cancelled.
    Cancelled,
    /// Start was requested on an interval that was already running.
    AlreadyRunning,
}

/// A side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Write the new record to the repository.
    Persist,
    /// Invoke the periodic callback with the new record.
    NotifyTick,
    /// Invoke the end callback with the new record.
    NotifyEnd,
    /// Run the tick loop until it reaches an outcome.
    RunTicker,
    /// Stop with the given outcome.
    Finish(Outcome),
}

/// Result of [`decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub interval: Interval,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(interval: Interval, effects: Vec<Effect>) -> Self {
        Self { interval, effects }
    }

    fn unchanged(current: &Interval, effects: Vec<Effect>) -> Self {
        Self::new(current.clone(), effects)
    }
}

/// Computes the transition for `command` applied to `current`.
pub fn decide(current: &Interval, command: Command) -> Result<Transition, Error> {
    match command {
        Command::Start { now } => start(current, now),
        Command::Pause => pause(current),
        Command::Tick => tick(current),
        Command::Expire => expire(current),
        Command::Cancel => Ok(cancel(current)),
    }
}

fn start(current: &Interval, now: DateTime<Utc>) -> Result<Transition, Error> {
    match current.state {
        State::Running => Ok(Transition::unchanged(
            current,
            vec![Effect::Finish(Outcome::AlreadyRunning)],
        )),
        State::NotStarted | State::Paused => {
            let mut next = current.clone();
            if current.state == State::NotStarted {
                next.start_time = Some(now);
            }
            next.state = State::Running;
            Ok(Transition::new(next, vec![Effect::Persist, Effect::RunTicker]))
        }
        State::Done | State::Cancelled => Err(Error::IntervalCompleted),
    }
}

fn pause(current: &Interval) -> Result<Transition, Error> {
    if current.state != State::Running {
        return Err(Error::IntervalNotRunning);
    }
    let mut next = current.clone();
    next.state = State::Paused;
    Ok(Transition::new(next, vec![Effect::Persist]))
}

fn tick(current: &Interval) -> Result<Transition, Error> {
    match current.state {
        State::Running => {}
        // The pause was persisted by whoever requested it.
        State::Paused => {
            return Ok(Transition::unchanged(
                current,
                vec![Effect::Finish(Outcome::Paused)],
            ));
        }
        State::Done | State::Cancelled => return Ok(finished_elsewhere(current)),
        State::NotStarted => return Err(Error::IntervalNotRunning),
    }

    let mut next = current.clone();
    next.actual_duration = (current.actual_duration + TICK).min(current.planned_duration);

    if next.actual_duration < next.planned_duration {
        return Ok(Transition::new(
            next,
            vec![Effect::Persist, Effect::NotifyTick],
        ));
    }

    next.state = State::Done;
    Ok(Transition::new(
        next,
        vec![
            Effect::Persist,
            Effect::NotifyTick,
            Effect::NotifyEnd,
            Effect::Finish(Outcome::Completed),
        ],
    ))
}

fn expire(current: &Interval) -> Result<Transition, Error> {
    match current.state {
        State::Running => {
            let mut next = current.clone();
            next.actual_duration = current.planned_duration;
            next.state = State::Done;
            Ok(Transition::new(
                next,
                vec![
                    Effect::NotifyEnd,
                    Effect::Persist,
                    Effect::Finish(Outcome::Completed),
                ],
            ))
        }
        State::Paused => Ok(Transition::unchanged(
            current,
            vec![Effect::Finish(Outcome::Paused)],
        )),
        State::Done | State::Cancelled => Ok(finished_elsewhere(current)),
        State::NotStarted => Err(Error::IntervalNotRunning),
    }
}

fn cancel(current: &Interval) -> Transition {
    if current.state.is_terminal() {
        return finished_elsewhere(current);
    }
    let mut next = current.clone();
    next.state = State::Cancelled;
    Transition::new(
        next,
        vec![Effect::Persist, Effect::Finish(Outcome::Cancelled)],
    )
}

/// The record reached a terminal state outside this loop; stop without writing.
fn finished_elsewhere(current: &Interval) -> Transition {
    let outcome = if current.state == State::Done {
        Outcome::Completed
    } else {
        Outcome::Cancelled
    };
    Transition::unchanged(current, vec![Effect::Finish(outcome)])
}
