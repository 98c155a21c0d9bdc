//! Repository layer for database CRUD operations
//!
//! Provides high-level database operations for focus sessions.

mod session;
mod stats;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

pub use super::error::StorageError;
use super::Database;
use crate::models::{Session, SessionId, TopicTotal};

/// Persistence operations the timer engine depends on
///
/// `Database` is the production implementation; the seam lets the engine be
/// exercised against failing or instrumented repositories.
pub trait SessionRepository {
    /// Insert an open session starting at `started_at`
    fn create_session_at(
        &self,
        topic: &str,
        started_at: DateTime<Utc>,
    ) -> Result<Session, StorageError>;

    /// Close an open session at `end_time`
    fn close_session(&self, id: SessionId, end_time: DateTime<Utc>)
        -> Result<Session, StorageError>;

    /// The open session, if any
    fn get_open_session(&self) -> Result<Option<Session>, StorageError>;
}

impl SessionRepository for Database {
    fn create_session_at(
        &self,
        topic: &str,
        started_at: DateTime<Utc>,
    ) -> Result<Session, StorageError> {
        Database::create_session_at(self, topic, started_at)
    }

    fn close_session(
        &self,
        id: SessionId,
        end_time: DateTime<Utc>,
    ) -> Result<Session, StorageError> {
        Database::close_session(self, id, end_time)
    }

    fn get_open_session(&self) -> Result<Option<Session>, StorageError> {
        Database::get_open_session(self)
    }
}

/// Column list matching `session_from_row`
pub(super) const SESSION_COLUMNS: &str = "id, topic, start_time, end_time, duration_seconds";

/// Format a timestamp in the sortable storage form
pub(super) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp
pub(super) fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// Map a row selected with `SESSION_COLUMNS`
pub(super) fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let start_time: String = row.get(2)?;
    let end_time: Option<String> = row.get(3)?;

    Ok(Session {
        id: row.get(0)?,
        topic: row.get(1)?,
        start_time: parse_timestamp(&start_time, 2)?,
        end_time: end_time
            .as_deref()
            .map(|value| parse_timestamp(value, 3))
            .transpose()?,
        duration_seconds: row.get(4)?,
    })
}

/// Map a `list_topics` row: topic, count, closed seconds, latest start
///
/// The count is range-checked; a value past `u32::MAX` is an error.
pub(super) fn topic_total_from_row(row: &Row<'_>) -> rusqlite::Result<TopicTotal> {
    let last_started_at: String = row.get(3)?;

    Ok(TopicTotal {
        topic: row.get(0)?,
        session_count: row.get(1)?,
        total_seconds: row.get(2)?,
        last_started_at: parse_timestamp(&last_started_at, 3)?,
    })
}
