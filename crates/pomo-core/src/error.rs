//! Error kinds shared by the engine and repository implementations.

use thiserror::Error;

use crate::types::IntervalId;

/// Boxed backend error carried by [`Error::Storage`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Interval engine errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The repository holds no intervals yet.
    #[error("no intervals")]
    NoIntervals,

    /// Pause was requested on an interval that is not running.
    #[error("interval not running")]
    IntervalNotRunning,

    /// Start was requested on a done or cancelled interval.
    #[error("interval is completed or cancelled: cannot start")]
    IntervalCompleted,

    /// A stored state code is not one of the known states.
    #[error("invalid state: {0}")]
    InvalidState(i64),

    /// A stored category is not one of the known categories.
    #[error("invalid category: {0}")]
    InvalidCategory(String),

    /// No interval exists with the given ID.
    #[error("invalid interval id: {0}")]
    InvalidId(IntervalId),

    /// The storage backend failed.
    #[error("failed to {action}: {source}")]
    Storage {
        action: &'static str,
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Wraps a backend error with the repository operation that produced it.
    pub fn storage(action: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Storage {
            action,
            source: source.into(),
        }
    }
}
