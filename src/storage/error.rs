//! Storage module error types
//!
//! Provides error types for database operations.

use thiserror::Error;

use crate::error::ErrorKind;
use crate::models::SessionId;

/// Storage operation error type
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A second open session was requested while one is still open
    #[error("session {0} is still open; stop it before starting another")]
    OpenSessionExists(SessionId),

    /// Session not found
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// Session was already closed
    #[error("session already closed: {0}")]
    SessionClosed(SessionId),

    /// Lock error when accessing database
    #[error("database lock error")]
    LockError,

    /// Invalid input parameters
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StorageError {
    /// Error category reported to callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Database(_) | Self::LockError => ErrorKind::Persistence,
            Self::OpenSessionExists(_) => ErrorKind::Conflict,
            Self::SessionNotFound(_) => ErrorKind::NotFound,
            Self::SessionClosed(_) | Self::InvalidInput(_) => ErrorKind::InvalidState,
        }
    }
}
