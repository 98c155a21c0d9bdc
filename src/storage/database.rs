//! SQLite database connection management
//!
//! Provides database initialization and connection management for Pulse.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::debug;

use super::error::StorageError;

/// Database handle shared between the store façade and read/admin paths
pub type SharedDatabase = Arc<Mutex<Database>>;

/// Database wrapper for SQLite connection management
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize schema
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    /// A new Database instance with initialized schema
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;

        // Every write must be durable before the call returns
        conn.execute_batch("PRAGMA synchronous = FULL;")?;
        conn.execute_batch(include_str!("schema.sql"))?;

        debug!(path = %path.display(), "Opened session database");
        Ok(Self { conn })
    }

    /// Create an in-memory database for testing
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// Wrap the database for shared ownership
    pub fn into_shared(self) -> SharedDatabase {
        Arc::new(Mutex::new(self))
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get a mutable reference to the underlying connection
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

/// Lock a shared database, mapping poisoning to `StorageError::LockError`
pub fn lock_database(db: &SharedDatabase) -> Result<MutexGuard<'_, Database>, StorageError> {
    db.lock().map_err(|_| StorageError::LockError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_database_creation() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let db = Database::new(&db_path);
        assert!(db.is_ok(), "Database creation failed: {:?}", db.err());

        // Verify database file exists
        assert!(db_path.exists());
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        {
            let db = Database::new(&db_path).unwrap();
            db.create_session("Reading").unwrap();
        }

        let db = Database::new(&db_path).unwrap();
        let open = db.get_open_session().unwrap();
        assert_eq!(open.map(|s| s.topic), Some("Reading".to_string()));
    }

    #[test]
    fn test_schema_initialization() {
        let db = Database::new_in_memory().unwrap();

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);

        let index_count: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_sessions_single_open'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 1);
    }

    #[test]
    fn test_single_open_index_rejects_raw_second_open_row() {
        let db = Database::new_in_memory().unwrap();
        db.connection()
            .execute(
                "INSERT INTO sessions (topic, start_time) VALUES ('a', '2024-01-15T10:00:00.000Z')",
                [],
            )
            .unwrap();

        let second = db.connection().execute(
            "INSERT INTO sessions (topic, start_time) VALUES ('b', '2024-01-15T11:00:00.000Z')",
            [],
        );
        assert!(second.is_err());
    }
}
