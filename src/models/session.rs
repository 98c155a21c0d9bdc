//! Session data models for Pulse
//!
//! Defines the persisted focus `Session` record and the lightweight
//! aggregate rows derived from it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Repository-assigned session identifier (SQLite rowid, never reused)
pub type SessionId = i64;

/// Label shown for sessions whose topic is empty
pub const UNTITLED_TOPIC: &str = "Untitled";

/// A single focus session
///
/// A session is "open" while `end_time` is `None`; that row is the persisted
/// counterpart of the running timer. Once closed, only `topic` may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Session {
    /// Unique ID
    pub id: SessionId,
    /// Free-text label, shared by many sessions
    pub topic: String,
    /// When the session was started
    pub start_time: DateTime<Utc>,
    /// When the session was closed (None while open)
    pub end_time: Option<DateTime<Utc>>,
    /// Whole seconds between start and end, 0 while open
    pub duration_seconds: i64,
}

impl Session {
    /// Whether this session is still open
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Topic for display, falling back to "Untitled"
    pub fn display_topic(&self) -> &str {
        if self.topic.trim().is_empty() {
            UNTITLED_TOPIC
        } else {
            &self.topic
        }
    }
}

/// Total focused seconds for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DailyStat {
    /// Calendar date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Summed duration of closed sessions started that day
    pub total_seconds: i64,
}

/// Per-topic totals used by the topic list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TopicTotal {
    pub topic: String,
    pub session_count: u32,
    /// Closed sessions only
    pub total_seconds: i64,
    pub last_started_at: DateTime<Utc>,
}

/// Rounds the span between two instants to whole seconds (half rounds up)
///
/// Negative spans clamp to zero.
pub fn rounded_seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds().max(0);
    (millis + 500) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn session(topic: &str) -> Session {
        Session {
            id: 1,
            topic: topic.to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
            end_time: None,
            duration_seconds: 0,
        }
    }

    #[test]
    fn test_display_topic_falls_back_to_untitled() {
        assert_eq!(session("").display_topic(), "Untitled");
        assert_eq!(session("   ").display_topic(), "Untitled");
        assert_eq!(session("Rust").display_topic(), "Rust");
    }

    #[test]
    fn test_is_open() {
        let mut s = session("Rust");
        assert!(s.is_open());
        s.end_time = Some(s.start_time + Duration::minutes(5));
        assert!(!s.is_open());
    }

    #[test]
    fn test_rounded_seconds_between() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        assert_eq!(rounded_seconds_between(start, start + Duration::milliseconds(1499)), 1);
        assert_eq!(rounded_seconds_between(start, start + Duration::milliseconds(1500)), 2);
        assert_eq!(rounded_seconds_between(start, start + Duration::seconds(600)), 600);
        assert_eq!(rounded_seconds_between(start, start - Duration::seconds(5)), 0);
    }

    #[test]
    fn test_daily_stat_serializes_iso_date() {
        let stat = DailyStat {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            total_seconds: 600,
        };
        let json = serde_json::to_string(&stat).unwrap();
        assert_eq!(json, r#"{"date":"2024-01-15","total_seconds":600}"#);
    }
}
