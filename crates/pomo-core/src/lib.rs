//! Interval timer engine for the pomodoro technique.
//!
//! This crate contains:
//! - Category selection: which kind of interval comes next, derived from history
//! - Interval lifecycle: creation, start/pause and the state machine behind them
//! - The tick loop that advances a running interval once per second
//! - The [`Repository`] contract every interval is persisted through

mod category;
mod config;
mod error;
mod interval;
pub mod machine;
mod repository;
mod ticker;
mod types;

pub use category::next_category;
pub use config::{DEFAULT_LONG_BREAK, DEFAULT_POMODORO, DEFAULT_SHORT_BREAK, IntervalConfig};
pub use error::{BoxError, Error};
pub use interval::get_interval;
pub use machine::Outcome;
pub use repository::{MemoryRepository, Repository};
pub use ticker::{Callbacks, FnCallbacks};
pub use types::{Category, Interval, IntervalId, State};
