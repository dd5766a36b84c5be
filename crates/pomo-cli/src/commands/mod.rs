//! CLI subcommand implementations.

pub mod history;
pub mod pause;
pub mod start;
pub mod status;
pub mod summary;
pub mod util;
