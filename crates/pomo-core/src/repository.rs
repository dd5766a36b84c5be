//! Persistence contract for interval records.
//!
//! The engine never keeps interval state in memory across a suspension point:
//! every decision re-reads the record through this trait, so the repository is
//! the single source of truth. Implementations are expected to serialize
//! concurrent writes to the same record.

use std::sync::{Mutex, MutexGuard};

use crate::error::Error;
use crate::types::{Interval, IntervalId};

/// Abstract storage for intervals.
pub trait Repository: Send + Sync {
    /// Persists a new interval and returns its assigned ID.
    ///
    /// The `id` field of `interval` is ignored.
    fn create(&self, interval: &Interval) -> Result<IntervalId, Error>;

    /// Overwrites the mutable fields of an existing interval, keyed by ID.
    fn update(&self, interval: &Interval) -> Result<(), Error>;

    /// Fetches an interval by ID, failing with [`Error::InvalidId`] if absent.
    fn by_id(&self, id: IntervalId) -> Result<Interval, Error>;

    /// Fetches the most recent interval, failing with [`Error::NoIntervals`] if
    /// the store is empty.
    fn last(&self) -> Result<Interval, Error>;

    /// Returns up to `n` of the most recent break intervals, most recent first.
    fn breaks(&self, n: usize) -> Result<Vec<Interval>, Error>;
}

/// Repository backed by a vector in memory.
///
/// IDs are assigned sequentially starting at 1.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    intervals: Mutex<Vec<Interval>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Interval>>, Error> {
        self.intervals
            .lock()
            .map_err(|err| Error::storage("lock memory repository", err.to_string()))
    }

    /// Returns every stored interval, oldest first.
    pub fn snapshot(&self) -> Result<Vec<Interval>, Error> {
        Ok(self.lock()?.clone())
    }
}

impl Repository for MemoryRepository {
    fn create(&self, interval: &Interval) -> Result<IntervalId, Error> {
        let mut intervals = self.lock()?;
        let id = IntervalId::new(intervals.last().map_or(1, |last| last.id.get() + 1));
        let mut stored = interval.clone();
        stored.id = id;
        intervals.push(stored);
        Ok(id)
    }

    fn update(&self, interval: &Interval) -> Result<(), Error> {
        let mut intervals = self.lock()?;
        let slot = intervals
            .iter_mut()
            .find(|stored| stored.id == interval.id)
            .ok_or(Error::InvalidId(interval.id))?;
        *slot = interval.clone();
        Ok(())
    }

    fn by_id(&self, id: IntervalId) -> Result<Interval, Error> {
        self.lock()?
            .iter()
            .find(|stored| stored.id == id)
            .cloned()
            .ok_or(Error::InvalidId(id))
    }

    fn last(&self) -> Result<Interval, Error> {
        self.lock()?.last().cloned().ok_or(Error::NoIntervals)
    }

    fn breaks(&self, n: usize) -> Result<Vec<Interval>, Error> {
        Ok(self
            .lock()?
            .iter()
            .rev()
            .filter(|stored| stored.category.is_break())
            .take(n)
            .cloned()
            .collect())
    }
}
