//! Storage layer for the pomodoro timer.
//!
//! Provides a SQLite implementation of [`pomo_core::Repository`] using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type keeps its `rusqlite::Connection` behind a `Mutex`, so
//! it is `Send + Sync` and can be shared through an `Arc` between the tick loop
//! and whoever pauses the interval. Writes to the same record are serialized by
//! the mutex; separate processes are serialized by SQLite's own file locking.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! `start_time` is stored as TEXT in RFC 3339 format with millisecond
//! precision (e.g., `2024-01-15T10:30:00.000Z`), or NULL before the interval
//! first runs. Lexicographic order matches chronological order.
//!
//! ## Durations and States
//!
//! Durations are INTEGER milliseconds. `state` holds the numeric code from
//! [`State::code`]; `category` holds the category name. Rows with unknown
//! values surface as [`pomo_core::Error::InvalidState`] or
//! [`pomo_core::Error::InvalidCategory`] when read.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use pomo_core::{Category, Interval, IntervalId, Repository, State};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The connection mutex was poisoned by a panicking holder.
    #[error("database connection lock poisoned")]
    Poisoned,
    /// Failed to parse a stored start time.
    #[error("invalid start time for interval {id}: {timestamp}")]
    TimestampParse {
        id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored duration was negative.
    #[error("invalid duration for interval {id}: {value}ms")]
    InvalidDuration { id: i64, value: i64 },
    /// A stored row could not be decoded into an interval.
    #[error("invalid interval {id}: {source}")]
    InvalidInterval {
        id: i64,
        #[source]
        source: pomo_core::Error,
    },
    /// A summary row named an unknown category.
    #[error("invalid category in summary: {0}")]
    InvalidSummary(#[source] pomo_core::Error),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Mutex<Connection>,
}

/// Total time spent in one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Duration,
    pub intervals: usize,
}

/// Raw interval row before validation.
#[derive(Debug)]
struct IntervalRow {
    id: i64,
    start_time: Option<String>,
    planned_duration_ms: i64,
    actual_duration_ms: i64,
    category: String,
    state: i64,
}

const SELECT_INTERVAL: &str = "
    SELECT id, start_time, planned_duration_ms, actual_duration_ms, category, state
    FROM interval
";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(conn: Connection) -> Result<Self, DbError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS interval (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_time TEXT,
                planned_duration_ms INTEGER NOT NULL,
                actual_duration_ms INTEGER NOT NULL DEFAULT 0,
                category TEXT NOT NULL,
                state INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_interval_category ON interval(category);
            CREATE INDEX IF NOT EXISTS idx_interval_start_time ON interval(start_time);
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    /// Inserts a new interval and returns its ID.
    pub fn insert_interval(&self, interval: &Interval) -> Result<IntervalId, DbError> {
        let conn = self.conn()?;
        conn.execute(
            "
            INSERT INTO interval (start_time, planned_duration_ms, actual_duration_ms, category, state)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![
                interval.start_time.map(format_timestamp),
                duration_ms(interval.planned_duration),
                duration_ms(interval.actual_duration),
                interval.category.as_str(),
                interval.state.code(),
            ],
        )?;
        Ok(IntervalId::new(conn.last_insert_rowid()))
    }

    /// Overwrites an interval's mutable fields. Returns whether a row matched.
    pub fn update_interval(&self, interval: &Interval) -> Result<bool, DbError> {
        let updated = self.conn()?.execute(
            "
            UPDATE interval
            SET start_time = ?, actual_duration_ms = ?, state = ?
            WHERE id = ?
            ",
            params![
                interval.start_time.map(format_timestamp),
                duration_ms(interval.actual_duration),
                interval.state.code(),
                interval.id.get(),
            ],
        )?;
        Ok(updated > 0)
    }

    /// Fetches an interval by ID.
    pub fn find_interval(&self, id: IntervalId) -> Result<Option<Interval>, DbError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("{SELECT_INTERVAL} WHERE id = ?"),
                [id.get()],
                read_row,
            )
            .optional()?;
        row.map(IntervalRow::into_interval).transpose()
    }

    /// Fetches the most recently created interval.
    pub fn last_interval(&self) -> Result<Option<Interval>, DbError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("{SELECT_INTERVAL} ORDER BY id DESC LIMIT 1"),
                [],
                read_row,
            )
            .optional()?;
        row.map(IntervalRow::into_interval).transpose()
    }

    /// Lists up to `limit` break intervals, most recent first.
    pub fn list_breaks(&self, limit: usize) -> Result<Vec<Interval>, DbError> {
        self.query_intervals(
            &format!(
                "{SELECT_INTERVAL} WHERE category IN ('ShortBreak', 'LongBreak') ORDER BY id DESC LIMIT ?"
            ),
            limit,
        )
    }

    /// Lists up to `limit` intervals of any category, most recent first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Interval>, DbError> {
        self.query_intervals(&format!("{SELECT_INTERVAL} ORDER BY id DESC LIMIT ?"), limit)
    }

    fn query_intervals(&self, sql: &str, limit: usize) -> Result<Vec<Interval>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([limit], read_row)?;
        let mut intervals = Vec::new();
        for row in rows {
            intervals.push(row?.into_interval()?);
        }
        Ok(intervals)
    }

    /// Sums actual running time per category for intervals started at or after `since`.
    ///
    /// Categories without any matching interval are omitted.
    pub fn category_summary(&self, since: DateTime<Utc>) -> Result<Vec<CategoryTotal>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "
            SELECT category, SUM(actual_duration_ms), COUNT(*)
            FROM interval
            WHERE start_time IS NOT NULL AND start_time >= ?
            GROUP BY category
            ORDER BY category ASC
            ",
        )?;
        let rows = stmt.query_map([format_timestamp(since)], |row| {
            let category: String = row.get(0)?;
            let total_ms: i64 = row.get(1)?;
            let count: i64 = row.get(2)?;
            Ok((category, total_ms, count))
        })?;

        let mut totals = Vec::new();
        for row in rows {
            let (category, total_ms, count) = row?;
            let category = category
                .parse::<Category>()
                .map_err(DbError::InvalidSummary)?;
            totals.push(CategoryTotal {
                category,
                total: Duration::from_millis(u64::try_from(total_ms).unwrap_or(0)),
                intervals: usize::try_from(count).unwrap_or(0),
            });
        }
        Ok(totals)
    }
}

impl Repository for Database {
    fn create(&self, interval: &Interval) -> Result<IntervalId, pomo_core::Error> {
        let id = self
            .insert_interval(interval)
            .map_err(|err| storage_error("create interval", err))?;
        tracing::debug!(%id, category = %interval.category, "inserted interval");
        Ok(id)
    }

    fn update(&self, interval: &Interval) -> Result<(), pomo_core::Error> {
        let updated = self
            .update_interval(interval)
            .map_err(|err| storage_error("update interval", err))?;
        if !updated {
            return Err(pomo_core::Error::InvalidId(interval.id));
        }
        Ok(())
    }

    fn by_id(&self, id: IntervalId) -> Result<Interval, pomo_core::Error> {
        self.find_interval(id)
            .map_err(|err| storage_error("fetch interval", err))?
            .ok_or(pomo_core::Error::InvalidId(id))
    }

    fn last(&self) -> Result<Interval, pomo_core::Error> {
        self.last_interval()
            .map_err(|err| storage_error("fetch last interval", err))?
            .ok_or(pomo_core::Error::NoIntervals)
    }

    fn breaks(&self, n: usize) -> Result<Vec<Interval>, pomo_core::Error> {
        self.list_breaks(n)
            .map_err(|err| storage_error("fetch breaks", err))
    }
}

/// Corrupt rows keep their specific kind; everything else is a storage failure.
fn storage_error(action: &'static str, err: DbError) -> pomo_core::Error {
    match err {
        DbError::InvalidInterval { source, .. } | DbError::InvalidSummary(source) => source,
        other => pomo_core::Error::storage(action, other),
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<IntervalRow> {
    Ok(IntervalRow {
        id: row.get(0)?,
        start_time: row.get(1)?,
        planned_duration_ms: row.get(2)?,
        actual_duration_ms: row.get(3)?,
        category: row.get(4)?,
        state: row.get(5)?,
    })
}

impl IntervalRow {
    fn into_interval(self) -> Result<Interval, DbError> {
        let id = self.id;
        let invalid = |source: pomo_core::Error| DbError::InvalidInterval { id, source };

        let start_time = self
            .start_time
            .map(|timestamp| parse_timestamp(&timestamp, id))
            .transpose()?;

        Ok(Interval {
            id: IntervalId::new(id),
            start_time,
            planned_duration: parse_duration(self.planned_duration_ms, id)?,
            actual_duration: parse_duration(self.actual_duration_ms, id)?,
            category: self.category.parse::<Category>().map_err(invalid)?,
            state: State::try_from(self.state).map_err(invalid)?,
        })
    }
}

fn parse_timestamp(timestamp: &str, id: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            id,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_duration(ms: i64, id: i64) -> Result<Duration, DbError> {
    u64::try_from(ms)
        .map(Duration::from_millis)
        .map_err(|_| DbError::InvalidDuration { id, value: ms })
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
