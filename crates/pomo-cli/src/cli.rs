//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Interactive pomodoro timer.
///
/// Alternates work intervals with short breaks, and every fourth work interval
/// with a long break. Interval history is kept in a local database.
#[derive(Debug, Parser)]
#[command(name = "pomo", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Pomodoro duration in minutes.
    #[arg(short, long, global = true, value_name = "MINUTES")]
    pub pomo: Option<i64>,

    /// Short break duration in minutes.
    #[arg(short, long, global = true, value_name = "MINUTES")]
    pub short: Option<i64>,

    /// Long break duration in minutes.
    #[arg(short, long, global = true, value_name = "MINUTES")]
    pub long: Option<i64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start or resume the current interval. Ctrl-C cancels it.
    Start,

    /// Pause the running interval.
    Pause,

    /// Show the current interval.
    Status,

    /// List recent intervals.
    History {
        /// Maximum number of intervals to show.
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Output as JSON lines.
        #[arg(long)]
        json: bool,
    },

    /// Show today's time per category.
    Summary,
}
