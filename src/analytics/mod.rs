//! Analytics module for focus statistics
//!
//! Derives streaks, ranged summaries and topic histories from repository
//! query results.
//!
//! ## Architecture
//!
//! - **Daily totals**: produced by the repository, consumed as-is here
//! - **Streaks and week summaries**: computed from the daily-totals map
//! - **Topic history**: computed from a topic's session list
//!
//! Every function is pure, so identical inputs give identical outputs.

mod types;

pub use types::*;

/// Calculator module for streak and summary computation
pub mod calculator;

#[cfg(test)]
mod calculator_tests;
