//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pomo_core::{IntervalConfig, Repository};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Pomodoro length; non-positive values use the default.
    pub pomodoro_minutes: i64,
    /// Short break length; non-positive values use the default.
    pub short_break_minutes: i64,
    /// Long break length; non-positive values use the default.
    pub long_break_minutes: i64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("pomodoro_minutes", &self.pomodoro_minutes)
            .field("short_break_minutes", &self.short_break_minutes)
            .field("long_break_minutes", &self.long_break_minutes)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("pomo.db"),
            pomodoro_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (POMO_*)
        figment = figment.merge(Env::prefixed("POMO_"));

        figment.extract()
    }

    /// Applies durations given on the command line.
    #[must_use]
    pub fn with_overrides(
        mut self,
        pomodoro: Option<i64>,
        short_break: Option<i64>,
        long_break: Option<i64>,
    ) -> Self {
        if let Some(minutes) = pomodoro {
            self.pomodoro_minutes = minutes;
        }
        if let Some(minutes) = short_break {
            self.short_break_minutes = minutes;
        }
        if let Some(minutes) = long_break {
            self.long_break_minutes = minutes;
        }
        self
    }

    /// Builds the engine configuration over `repo`.
    pub fn interval_config(&self, repo: Arc<dyn Repository>) -> IntervalConfig {
        IntervalConfig::new(
            repo,
            minutes(self.pomodoro_minutes),
            minutes(self.short_break_minutes),
            minutes(self.long_break_minutes),
        )
    }
}

/// Non-positive minutes map to zero, which the engine replaces with its default.
fn minutes(value: i64) -> Duration {
    u64::try_from(value)
        .ok()
        .and_then(|m| m.checked_mul(60))
        .map_or(Duration::ZERO, Duration::from_secs)
}

/// Returns the platform-specific config directory for pomo.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pomo"))
}

/// Returns the platform-specific data directory for pomo.
///
/// On Linux: `~/.local/share/pomo`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("pomo"))
}
