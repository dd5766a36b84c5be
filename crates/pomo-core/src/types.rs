//! Core type definitions for intervals.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Identifier assigned to an interval by the repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalId(i64);

impl IntervalId {
    /// Placeholder carried by an interval that has not been created yet.
    pub const UNASSIGNED: Self = Self(0);

    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for IntervalId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The kind of an interval.
///
/// Work intervals are called pomodoros; every pomodoro is followed by a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl Category {
    /// String representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pomodoro => "Pomodoro",
            Self::ShortBreak => "ShortBreak",
            Self::LongBreak => "LongBreak",
        }
    }

    #[must_use]
    pub const fn is_break(&self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pomodoro" => Ok(Self::Pomodoro),
            "ShortBreak" => Ok(Self::ShortBreak),
            "LongBreak" => Ok(Self::LongBreak),
            _ => Err(Error::InvalidCategory(s.to_string())),
        }
    }
}

/// Lifecycle state of an interval.
///
/// ```text
/// NotStarted -> Running <-> Paused -> Done
///      \            |          /
///       +------> Cancelled <--+
/// ```
///
/// `Done` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    NotStarted,
    Running,
    Paused,
    Done,
    Cancelled,
}

impl State {
    /// Numeric code used for storage.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::NotStarted => 0,
            Self::Running => 1,
            Self::Paused => 2,
            Self::Done => 3,
            Self::Cancelled => 4,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

impl TryFrom<i64> for State {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::NotStarted),
            1 => Ok(Self::Running),
            2 => Ok(Self::Paused),
            3 => Ok(Self::Done),
            4 => Ok(Self::Cancelled),
            other => Err(Error::InvalidState(other)),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// One timed session of work or rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    /// Assigned by the repository on creation.
    pub id: IntervalId,
    /// Set at the first transition into `Running`.
    pub start_time: Option<DateTime<Utc>>,
    pub planned_duration: Duration,
    /// Elapsed running time, advanced one second per tick.
    pub actual_duration: Duration,
    pub category: Category,
    pub state: State,
}

impl Interval {
    /// Builds an interval that has not been persisted yet.
    #[must_use]
    pub const fn draft(category: Category, planned_duration: Duration) -> Self {
        Self {
            id: IntervalId::UNASSIGNED,
            start_time: None,
            planned_duration,
            actual_duration: Duration::ZERO,
            category,
            state: State::NotStarted,
        }
    }

    /// Time left before the interval completes.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.planned_duration.saturating_sub(self.actual_duration)
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }
}
