//! Local storage module for Pulse
//!
//! Provides SQLite-based persistence for focus sessions. The database is the
//! single source of truth; everything else is derived from it.

mod database;
mod error;
mod repository;

pub use database::{lock_database, Database, SharedDatabase};
pub use error::StorageError;
pub use repository::SessionRepository;
