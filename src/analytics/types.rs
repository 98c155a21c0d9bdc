//! Analytics type definitions
//!
//! Contains data structures for ranged summaries and topic history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DailyStat, Session};

/// Days in a report week
pub const WEEK_DAYS: u32 = 7;

/// Furthest week offset reports accept, about ten years back
pub const MAX_WEEK_OFFSET: u32 = 520;

/// Totals over an inclusive range of days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RangeSummary {
    /// First day of the range
    pub start: NaiveDate,

    /// Last day of the range (inclusive)
    pub end: NaiveDate,

    /// One entry per day, oldest first
    pub days: Vec<DailyStat>,

    /// Sum of all days
    pub total_seconds: i64,

    /// Total divided by the number of days, floored
    pub average_seconds: i64,
}

/// One day of a topic's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TopicDay {
    pub date: NaiveDate,
    /// Most recent first
    pub sessions: Vec<Session>,
}

/// Aggregated history for a single topic
///
/// Grouped by topic, so it is stale after a rename and must be recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TopicHistory {
    pub topic: String,
    pub session_count: u32,
    /// Closed sessions only
    pub total_seconds: i64,
    /// Most recent day first
    pub days: Vec<TopicDay>,
}
