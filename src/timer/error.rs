//! Timer error types

use thiserror::Error;

use crate::error::ErrorKind;
use crate::storage::StorageError;

/// Timer transition error type
#[derive(Error, Debug)]
pub enum TimerError {
    /// `start` or `recover` while a session is running
    #[error("a session is already running")]
    AlreadyRunning,

    /// `tick` or `stop` while idle
    #[error("no session is running")]
    NotRunning,

    /// Topic was empty after trimming
    #[error("topic must not be empty")]
    EmptyTopic,

    /// Repository failure during a transition
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TimerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRunning | Self::NotRunning | Self::EmptyTopic => ErrorKind::InvalidState,
            Self::Storage(e) => e.kind(),
        }
    }
}
