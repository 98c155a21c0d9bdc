//! Session CRUD operations
//!
//! Provides session management methods for the Database.

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use super::{
    format_timestamp, session_from_row, topic_total_from_row, StorageError, SESSION_COLUMNS,
};
use crate::models::{rounded_seconds_between, DayPolicy, Session, SessionId, TopicTotal};
use crate::storage::Database;

impl Database {
    /// Open a new session starting now
    ///
    /// # Arguments
    /// * `topic` - Label stored verbatim (may be empty)
    pub fn create_session(&self, topic: &str) -> Result<Session, StorageError> {
        self.create_session_at(topic, Utc::now())
    }

    /// Open a new session starting at `started_at`
    ///
    /// Fails with `OpenSessionExists` while another session is open. The
    /// schema's partial unique index backs this check up if two writers race.
    pub fn create_session_at(
        &self,
        topic: &str,
        started_at: DateTime<Utc>,
    ) -> Result<Session, StorageError> {
        if let Some(open) = self.get_open_session()? {
            return Err(StorageError::OpenSessionExists(open.id));
        }

        // Stored with millisecond precision
        let started_at = started_at.trunc_subsecs(3);

        let inserted = self.connection().execute(
            "INSERT INTO sessions (topic, start_time, end_time, duration_seconds)
             VALUES (?1, ?2, NULL, 0)",
            params![topic, format_timestamp(started_at)],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                let open_id = self.get_open_session()?.map(|s| s.id).unwrap_or_default();
                return Err(StorageError::OpenSessionExists(open_id));
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.connection().last_insert_rowid();
        info!(session_id = id, topic, "Opened session");

        Ok(Session {
            id,
            topic: topic.to_string(),
            start_time: started_at,
            end_time: None,
            duration_seconds: 0,
        })
    }

    /// Close an open session
    ///
    /// # Arguments
    /// * `id` - The session to close
    /// * `end_time` - Close time; must not precede the start time
    ///
    /// # Returns
    /// The closed session with its fixed `duration_seconds`
    pub fn close_session(
        &self,
        id: SessionId,
        end_time: DateTime<Utc>,
    ) -> Result<Session, StorageError> {
        let session = self
            .get_session(id)?
            .ok_or(StorageError::SessionNotFound(id))?;

        if !session.is_open() {
            return Err(StorageError::SessionClosed(id));
        }

        let end_time = end_time.trunc_subsecs(3);
        if end_time < session.start_time {
            return Err(StorageError::InvalidInput(format!(
                "end time {} precedes start time {} of session {}",
                format_timestamp(end_time),
                format_timestamp(session.start_time),
                id
            )));
        }

        let duration_seconds = rounded_seconds_between(session.start_time, end_time);
        let updated = self.connection().execute(
            "UPDATE sessions SET end_time = ?1, duration_seconds = ?2
             WHERE id = ?3 AND end_time IS NULL",
            params![format_timestamp(end_time), duration_seconds, id],
        )?;

        if updated == 0 {
            return Err(StorageError::SessionClosed(id));
        }

        info!(session_id = id, duration_seconds, "Closed session");

        Ok(Session {
            end_time: Some(end_time),
            duration_seconds,
            ..session
        })
    }

    /// Get a session by ID
    pub fn get_session(&self, id: SessionId) -> Result<Option<Session>, StorageError> {
        let session = self
            .connection()
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![id],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    /// Get the open session, if any
    pub fn get_open_session(&self) -> Result<Option<Session>, StorageError> {
        let session = self
            .connection()
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions
                     WHERE end_time IS NULL ORDER BY start_time DESC LIMIT 1"
                ),
                [],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    /// List every session started on a calendar day, oldest first
    ///
    /// Open sessions are included.
    pub fn list_sessions_for_day(
        &self,
        date: NaiveDate,
        days: &DayPolicy,
    ) -> Result<Vec<Session>, StorageError> {
        let (start, end) = days.day_bounds(date);
        let mut stmt = self.connection().prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE start_time >= ?1 AND start_time < ?2
             ORDER BY start_time ASC, id ASC"
        ))?;

        let sessions = stmt
            .query_map(
                params![format_timestamp(start), format_timestamp(end)],
                session_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// All sessions with exactly this topic, most recent first
    pub fn get_sessions_by_topic(&self, topic: &str) -> Result<Vec<Session>, StorageError> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE topic = ?1
             ORDER BY start_time DESC, id DESC"
        ))?;

        let sessions = stmt
            .query_map(params![topic], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Delete a session
    ///
    /// Deleting an absent id is not an error.
    ///
    /// # Returns
    /// Whether a row was removed
    pub fn delete_session(&self, id: SessionId) -> Result<bool, StorageError> {
        let deleted = self
            .connection()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;

        if deleted > 0 {
            info!(session_id = id, "Deleted session");
        } else {
            debug!(session_id = id, "Delete skipped, session already absent");
        }
        Ok(deleted > 0)
    }

    /// Rename every session labelled `old_topic`
    ///
    /// Runs in a single transaction: either every matching row is renamed or
    /// none is.
    ///
    /// # Returns
    /// Number of renamed sessions
    pub fn rename_all_sessions_with_topic(
        &mut self,
        old_topic: &str,
        new_topic: &str,
    ) -> Result<usize, StorageError> {
        let new_topic = new_topic.trim();
        if new_topic.is_empty() {
            return Err(StorageError::InvalidInput(
                "new topic must not be empty".to_string(),
            ));
        }

        let tx = self.connection_mut().transaction()?;
        let renamed = tx.execute(
            "UPDATE sessions SET topic = ?1 WHERE topic = ?2",
            params![new_topic, old_topic],
        )?;
        tx.commit()?;

        info!(old_topic, new_topic, renamed, "Renamed topic");
        Ok(renamed)
    }

    /// Distinct topics with their totals, most recently used first
    pub fn list_topics(&self) -> Result<Vec<TopicTotal>, StorageError> {
        let mut stmt = self.connection().prepare(
            "SELECT topic,
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN end_time IS NOT NULL THEN duration_seconds ELSE 0 END), 0),
                    MAX(start_time)
             FROM sessions
             GROUP BY topic
             ORDER BY MAX(start_time) DESC",
        )?;

        let topics = stmt
            .query_map([], topic_total_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(topics)
    }
}
