//! Unified application error types
//!
//! Provides a single error type for the entire application, suitable for
//! returning to presentation code.

use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;
use crate::timer::TimerError;

/// Error category shared by every layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A second open session was attempted
    Conflict,
    /// Operation on an unknown id
    NotFound,
    /// Illegal transition or invalid input
    InvalidState,
    /// Underlying storage failure
    Persistence,
    /// Configuration, IO and other internal failures
    Internal,
}

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Storage error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Timer transition error
    #[error(transparent)]
    Timer(#[from] TimerError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// File operation error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Serializable error response for presentation code
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client-side handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl AppError {
    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(e) => e.kind(),
            Self::Timer(e) => e.kind(),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable code string for clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            _ => match self.kind() {
                ErrorKind::Conflict => "CONFLICT",
                ErrorKind::NotFound => "NOT_FOUND",
                ErrorKind::InvalidState => "INVALID_STATE",
                ErrorKind::Persistence => "PERSISTENCE_ERROR",
                ErrorKind::Internal => "INTERNAL_ERROR",
            },
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        }
        .serialize(serializer)
    }
}
