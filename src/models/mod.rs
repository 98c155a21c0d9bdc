//! Pulse data models
//!
//! This module defines the core data structures for focus sessions and
//! the calendar-day policy used to group them.

pub mod day;
pub mod session;

pub use day::*;
pub use session::*;
