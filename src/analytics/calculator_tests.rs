//! Unit tests for analytics calculator

use std::collections::BTreeMap;

use super::calculator::*;
use crate::models::{DayPolicy, Session};
use chrono::{Duration, NaiveDate, TimeZone, Utc};

// ===== Helper Functions =====

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

/// Build a totals map from seconds for today, yesterday, ...
fn totals_back(seconds: &[i64]) -> BTreeMap<NaiveDate, i64> {
    seconds
        .iter()
        .enumerate()
        .map(|(n, secs)| (today() - Duration::days(n as i64), *secs))
        .collect()
}

fn session(id: i64, topic: &str, day: u32, hour: u32, seconds: i64) -> Session {
    let start = Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
    Session {
        id,
        topic: topic.to_string(),
        start_time: start,
        end_time: Some(start + Duration::seconds(seconds)),
        duration_seconds: seconds,
    }
}

// ===== current_streak Tests =====

#[test]
fn test_streak_counts_today_when_active() {
    assert_eq!(current_streak(&totals_back(&[60, 600, 300, 0, 100]), today()), 3);
}

#[test]
fn test_streak_skips_empty_today() {
    // {T:0, T-1:600, T-2:300, T-3:0}
    assert_eq!(current_streak(&totals_back(&[0, 600, 300, 0]), today()), 2);
    // {T:0, T-1:600, T-2:300, T-3:100, T-4:0}
    assert_eq!(current_streak(&totals_back(&[0, 600, 300, 100, 0]), today()), 3);
}

#[test]
fn test_streak_zero_when_yesterday_empty() {
    assert_eq!(current_streak(&totals_back(&[0, 0, 300, 300]), today()), 0);
    assert_eq!(current_streak(&BTreeMap::new(), today()), 0);
}

#[test]
fn test_streak_only_today() {
    assert_eq!(current_streak(&totals_back(&[1]), today()), 1);
}

#[test]
fn test_streak_stops_at_map_edge() {
    // Days before the map are treated as empty
    assert_eq!(current_streak(&totals_back(&[10, 10, 10]), today()), 3);
}

// ===== range / weekly summary Tests =====

#[test]
fn test_weekly_summary_current_week() {
    let totals = totals_back(&[700, 0, 0, 0, 0, 0, 0, 99999]);
    let week = weekly_summary(&totals, today(), 0).unwrap();

    assert_eq!(week.days.len(), 7);
    assert_eq!(week.end, today());
    assert_eq!(week.start, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
    assert_eq!(week.total_seconds, 700);
    assert_eq!(week.average_seconds, 100);
}

#[test]
fn test_weekly_summary_previous_week() {
    let mut seconds = vec![0; 14];
    seconds[7] = 3600;
    seconds[13] = 3600;
    let week = weekly_summary(&totals_back(&seconds), today(), 1).unwrap();

    assert_eq!(week.end, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    assert_eq!(week.start, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    assert_eq!(week.total_seconds, 7200);
    assert_eq!(week.average_seconds, 7200 / 7);
    assert_eq!(days_needed_for_week(1), Some(14));
}

#[test]
fn test_days_needed_for_week_overflow() {
    assert_eq!(days_needed_for_week(0), Some(7));
    assert_eq!(
        days_needed_for_week(crate::analytics::MAX_WEEK_OFFSET),
        Some(521 * 7)
    );
    assert_eq!(days_needed_for_week(u32::MAX), None);
    assert_eq!(days_needed_for_week(u32::MAX / 7), None);
}

#[test]
fn test_range_summary_missing_days_are_zero() {
    let summary = range_summary(&BTreeMap::new(), today() - Duration::days(2), today());
    assert_eq!(summary.days.len(), 3);
    assert!(summary.days.iter().all(|d| d.total_seconds == 0));
    assert_eq!(summary.average_seconds, 0);
}

#[test]
fn test_range_summary_reversed_range_is_empty() {
    let summary = range_summary(&totals_back(&[10]), today(), today() - Duration::days(1));
    assert!(summary.days.is_empty());
    assert_eq!(summary.total_seconds, 0);
}

// ===== lifetime / topic Tests =====

#[test]
fn test_lifetime_total_ignores_open_sessions() {
    let mut open = session(3, "Rust", 15, 12, 0);
    open.end_time = None;
    let sessions = vec![session(1, "Rust", 14, 9, 600), session(2, "Go", 15, 9, 300), open];

    assert_eq!(lifetime_total(&sessions), 900);
}

#[test]
fn test_summarize_topic_groups_by_day_most_recent_first() {
    let sessions = vec![
        session(1, "Rust", 13, 9, 600),
        session(3, "Rust", 15, 9, 300),
        session(2, "Rust", 15, 7, 60),
    ];
    let history = summarize_topic("Rust", &sessions, &DayPolicy::utc());

    assert_eq!(history.session_count, 3);
    assert_eq!(history.total_seconds, 960);
    assert_eq!(history.days.len(), 2);
    assert_eq!(history.days[0].date, today());
    let ids: Vec<i64> = history.days[0].sessions.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![3, 2]);
    assert_eq!(history.days[1].sessions[0].id, 1);
}

#[test]
fn test_summarize_topic_respects_offset() {
    // 20:00 UTC on the 14th is the 15th in UTC+9
    let sessions = vec![session(1, "Rust", 14, 20, 60), session(2, "Rust", 15, 1, 60)];
    let tokyo = DayPolicy::from_offset_minutes(9 * 60).unwrap();

    let history = summarize_topic("Rust", &sessions, &tokyo);
    assert_eq!(history.days.len(), 1);
    assert_eq!(history.days[0].sessions.len(), 2);
}

// ===== formatting Tests =====

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(0), "0m");
    assert_eq!(format_duration(59), "0m");
    assert_eq!(format_duration(25 * 60), "25m");
    assert_eq!(format_duration(3600 + 5 * 60 + 30), "1h 5m");
    assert_eq!(format_duration(-10), "0m");
}

#[test]
fn test_format_clock() {
    assert_eq!(format_clock(0), "00:00");
    assert_eq!(format_clock(75), "01:15");
    assert_eq!(format_clock(3600 + 62), "1:01:02");
}

// ============================================================================
// Property-Based Testing
// ============================================================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Streak straight from its definition over d(n)
    fn reference_streak(d: &[i64]) -> u32 {
        let at = |n: usize| d.get(n).copied().unwrap_or(0);
        if at(0) > 0 {
            (0..).take_while(|n| at(*n) > 0).count() as u32
        } else {
            (1..).take_while(|n| at(*n) > 0).count() as u32
        }
    }

    proptest! {
        /// Streak matches the day-by-day definition
        #[test]
        fn prop_streak_matches_definition(
            seconds in proptest::collection::vec(prop_oneof![Just(0i64), 1i64..5000], 0..40)
        ) {
            let totals = totals_back(&seconds);
            prop_assert_eq!(current_streak(&totals, today()), reference_streak(&seconds));
        }

        /// A week's total is the sum of its seven days
        #[test]
        fn prop_week_total_is_sum_of_days(
            seconds in proptest::collection::vec(0i64..10_000, 21),
            offset in 0u32..3
        ) {
            let totals = totals_back(&seconds);
            let week = weekly_summary(&totals, today(), offset).unwrap();
            let start = (offset * 7) as usize;
            let expected: i64 = seconds[start..start + 7].iter().sum();

            prop_assert_eq!(week.days.len(), 7);
            prop_assert_eq!(week.total_seconds, expected);
            prop_assert_eq!(week.average_seconds, expected / 7);
        }
    }
}
