//! Per-run interval configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::repository::Repository;
use crate::types::Category;

/// Default pomodoro length.
pub const DEFAULT_POMODORO: Duration = Duration::from_secs(25 * 60);
/// Default short break length.
pub const DEFAULT_SHORT_BREAK: Duration = Duration::from_secs(5 * 60);
/// Default long break length.
pub const DEFAULT_LONG_BREAK: Duration = Duration::from_secs(15 * 60);

/// Durations per category plus the repository every operation works against.
///
/// Cloning is cheap; clones share the same repository.
#[derive(Clone)]
pub struct IntervalConfig {
    repo: Arc<dyn Repository>,
    pub pomodoro: Duration,
    pub short_break: Duration,
    pub long_break: Duration,
}

impl fmt::Debug for IntervalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalConfig")
            .field("pomodoro", &self.pomodoro)
            .field("short_break", &self.short_break)
            .field("long_break", &self.long_break)
            .finish_non_exhaustive()
    }
}

impl IntervalConfig {
    /// Creates a configuration. Zero durations fall back to 25/5/15 minutes.
    pub fn new(
        repo: Arc<dyn Repository>,
        pomodoro: Duration,
        short_break: Duration,
        long_break: Duration,
    ) -> Self {
        Self {
            repo,
            pomodoro: or_default(pomodoro, DEFAULT_POMODORO),
            short_break: or_default(short_break, DEFAULT_SHORT_BREAK),
            long_break: or_default(long_break, DEFAULT_LONG_BREAK),
        }
    }

    /// Creates a configuration with the technique-standard durations.
    pub fn with_defaults(repo: Arc<dyn Repository>) -> Self {
        Self::new(repo, Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    pub fn repo(&self) -> &dyn Repository {
        self.repo.as_ref()
    }

    /// Planned duration for an interval of the given category.
    pub const fn duration_for(&self, category: Category) -> Duration {
        match category {
            Category::Pomodoro => self.pomodoro,
            Category::ShortBreak => self.short_break,
            Category::LongBreak => self.long_break,
        }
    }
}

fn or_default(value: Duration, default: Duration) -> Duration {
    if value.is_zero() { default } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    #[test]
    fn zero_durations_use_defaults() {
        let config = IntervalConfig::with_defaults(Arc::new(MemoryRepository::new()));
        assert_eq!(config.pomodoro, Duration::from_secs(1500));
        assert_eq!(config.short_break, Duration::from_secs(300));
        assert_eq!(config.long_break, Duration::from_secs(900));
    }

    #[test]
    fn explicit_durations_are_kept() {
        let config = IntervalConfig::new(
            Arc::new(MemoryRepository::new()),
            Duration::from_secs(3),
            Duration::ZERO,
            Duration::from_secs(7),
        );
        assert_eq!(config.duration_for(Category::Pomodoro), Duration::from_secs(3));
        assert_eq!(config.duration_for(Category::ShortBreak), DEFAULT_SHORT_BREAK);
        assert_eq!(config.duration_for(Category::LongBreak), Duration::from_secs(7));
    }
}
