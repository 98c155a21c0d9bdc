//! Analytics calculation logic
//!
//! Pure functions over repository results. Nothing here touches storage or
//! the clock; "today" is always passed in.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::models::{DailyStat, DayPolicy, Session};

use super::{RangeSummary, TopicDay, TopicHistory, WEEK_DAYS};

/// Seconds recorded for `date`, 0 when absent
fn seconds_on(totals: &BTreeMap<NaiveDate, i64>, date: NaiveDate) -> i64 {
    totals.get(&date).copied().unwrap_or(0)
}

/// Current day streak
///
/// Walks backward from today counting consecutive days with focused time.
/// An empty today does not break the streak: the walk then starts at
/// yesterday and today is not counted.
///
/// # Arguments
/// * `totals` - Seconds per day; missing days count as 0
/// * `today` - The day the walk starts from
pub fn current_streak(totals: &BTreeMap<NaiveDate, i64>, today: NaiveDate) -> u32 {
    let mut day = if seconds_on(totals, today) > 0 {
        Some(today)
    } else {
        today.pred_opt()
    };

    let mut streak = 0;
    while let Some(current) = day {
        if seconds_on(totals, current) <= 0 {
            break;
        }
        streak += 1;
        day = current.pred_opt();
    }

    streak
}

/// Lifetime total over a set of sessions (open sessions contribute nothing)
pub fn lifetime_total(sessions: &[Session]) -> i64 {
    sessions
        .iter()
        .filter(|s| !s.is_open())
        .map(|s| s.duration_seconds)
        .sum()
}

/// Summarize the inclusive range `start..=end` from precomputed daily totals
pub fn range_summary(
    totals: &BTreeMap<NaiveDate, i64>,
    start: NaiveDate,
    end: NaiveDate,
) -> RangeSummary {
    let days: Vec<DailyStat> = if start <= end {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .map(|date| DailyStat {
                date,
                total_seconds: seconds_on(totals, date),
            })
            .collect()
    } else {
        Vec::new()
    };

    let total_seconds: i64 = days.iter().map(|d| d.total_seconds).sum();
    let average_seconds = if days.is_empty() {
        0
    } else {
        total_seconds / days.len() as i64
    };

    RangeSummary {
        start,
        end,
        days,
        total_seconds,
        average_seconds,
    }
}

/// Seven-day window ending `week_offset` weeks before today
///
/// Offset 0 is the week ending today, 1 the week before it, and so on.
/// Returns `None` only when the window falls outside the calendar.
pub fn weekly_summary(
    totals: &BTreeMap<NaiveDate, i64>,
    today: NaiveDate,
    week_offset: u32,
) -> Option<RangeSummary> {
    let end = today.checked_sub_days(Days::new(u64::from(week_offset) * u64::from(WEEK_DAYS)))?;
    let start = end.checked_sub_days(Days::new(u64::from(WEEK_DAYS - 1)))?;
    Some(range_summary(totals, start, end))
}

/// Number of days `weekly_summary` needs to cover `week_offset`
///
/// `None` when the count does not fit in a `u32`.
pub fn days_needed_for_week(week_offset: u32) -> Option<u32> {
    week_offset.checked_add(1)?.checked_mul(WEEK_DAYS)
}

/// Build a topic's history from its sessions
///
/// # Arguments
/// * `topic` - Topic label
/// * `sessions` - Sessions with that topic, any order
/// * `days` - Day boundary policy for grouping
pub fn summarize_topic(topic: &str, sessions: &[Session], days: &DayPolicy) -> TopicHistory {
    let mut sorted: Vec<&Session> = sessions.iter().collect();
    sorted.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));

    let mut grouped: Vec<TopicDay> = Vec::new();
    for session in sorted {
        let date = days.date_of(session.start_time);
        match grouped.last_mut() {
            Some(day) if day.date == date => day.sessions.push(session.clone()),
            _ => grouped.push(TopicDay {
                date,
                sessions: vec![session.clone()],
            }),
        }
    }

    TopicHistory {
        topic: topic.to_string(),
        session_count: sessions.len() as u32,
        total_seconds: lifetime_total(sessions),
        days: grouped,
    }
}

/// Human-readable duration: "1h 5m" from one hour up, otherwise "5m"
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Stopwatch display: "MM:SS", or "H:MM:SS" from one hour up
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}
