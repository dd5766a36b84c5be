//! Pomodoro timer CLI library.
//!
//! This crate provides the command-line interface over the interval engine
//! and its SQLite store.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
