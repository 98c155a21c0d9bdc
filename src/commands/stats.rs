//! History and statistics commands

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::analytics::calculator::{
    current_streak, days_needed_for_week, format_duration, summarize_topic, weekly_summary,
};
use crate::analytics::{RangeSummary, TopicHistory};
use crate::error::AppError;
use crate::models::{DailyStat, DayPolicy, Session};
use crate::storage::{lock_database, Database, StorageError};

use super::CommandContext;

/// Weekly report with the heat-map range
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StatsReport {
    pub week_offset: u32,
    pub week: RangeSummary,
    pub current_streak: u32,
    pub total_focus_time: i64,
    /// Oldest first, one entry per day
    pub heatmap: Vec<DailyStat>,
}

/// List today's sessions
pub async fn today(ctx: &CommandContext) -> Result<(), AppError> {
    let (snapshot, days) = {
        let store = ctx.store.lock().await;
        (store.snapshot(), store.day_policy())
    };

    if ctx.json {
        return ctx.print_json(&snapshot.today_sessions);
    }
    if snapshot.today_sessions.is_empty() {
        println!("No sessions today.");
        return Ok(());
    }
    for session in &snapshot.today_sessions {
        println!("{}", render_session_line(session, &days));
    }
    Ok(())
}

/// Weekly totals, `week` weeks back
pub async fn stats(ctx: &CommandContext, week: u32) -> Result<(), AppError> {
    let (db, days) = {
        let store = ctx.store.lock().await;
        (store.database(), store.day_policy())
    };
    let today = days.today(Utc::now());

    let report = {
        let db = lock_database(&db)?;
        build_stats_report(&db, ctx.settings.stats_days, today, &days, week)?
    };

    if ctx.json {
        return ctx.print_json(&report);
    }
    println!("{}", render_stats(&report));
    Ok(())
}

/// Collect the weekly report
///
/// The week window and the heat-map are bounded by `week` and `stats_days`;
/// the streak is walked over the full history.
pub(crate) fn build_stats_report(
    db: &Database,
    stats_days: u32,
    today: NaiveDate,
    days: &DayPolicy,
    week: u32,
) -> Result<StatsReport, AppError> {
    let week_days = days_needed_for_week(week).ok_or_else(|| {
        StorageError::InvalidInput(format!("week offset {week} is out of range"))
    })?;
    let week_totals = db.get_daily_totals(week_days, today, days)?;
    let week_summary = weekly_summary(&week_totals, today, week).ok_or_else(|| {
        StorageError::InvalidInput(format!("week offset {week} is out of range"))
    })?;

    let all_totals = db.get_all_daily_totals(today, days)?;

    Ok(StatsReport {
        week_offset: week,
        week: week_summary,
        current_streak: current_streak(&all_totals, today),
        total_focus_time: db.total_focus_seconds()?,
        heatmap: db.get_daily_stats(stats_days, today, days)?,
    })
}

/// Sessions of one topic, grouped by day
pub async fn history(ctx: &CommandContext, topic: &str) -> Result<(), AppError> {
    let (db, days) = {
        let store = ctx.store.lock().await;
        (store.database(), store.day_policy())
    };

    let sessions = lock_database(&db)?.get_sessions_by_topic(topic)?;
    let history = summarize_topic(topic, &sessions, &days);

    if ctx.json {
        return ctx.print_json(&history);
    }
    println!("{}", render_history(&history, &days));
    Ok(())
}

/// All topics with their totals
pub async fn topics(ctx: &CommandContext) -> Result<(), AppError> {
    let db = ctx.store.lock().await.database();
    let topics = lock_database(&db)?.list_topics()?;

    if ctx.json {
        return ctx.print_json(&topics);
    }
    if topics.is_empty() {
        println!("No topics yet.");
        return Ok(());
    }
    for topic in &topics {
        let label = if topic.topic.trim().is_empty() {
            crate::models::UNTITLED_TOPIC
        } else {
            topic.topic.as_str()
        };
        println!(
            "{:<24} {:>8}  {} session(s)",
            label,
            format_duration(topic.total_seconds),
            topic.session_count
        );
    }
    Ok(())
}

fn local_time(instant: DateTime<Utc>, days: &DayPolicy) -> String {
    instant.with_timezone(&days.offset()).format("%H:%M").to_string()
}

/// One line per session: id, local start, topic and duration
pub(crate) fn render_session_line(session: &Session, days: &DayPolicy) -> String {
    let duration = if session.is_open() {
        "running".to_string()
    } else {
        format_duration(session.duration_seconds)
    };
    format!(
        "#{:<5} {}  {:<24} {}",
        session.id,
        local_time(session.start_time, days),
        session.display_topic(),
        duration
    )
}

fn week_label(offset: u32) -> String {
    match offset {
        0 => "This Week".to_string(),
        1 => "Last Week".to_string(),
        n => format!("{n} Weeks Ago"),
    }
}

pub(crate) fn render_stats(report: &StatsReport) -> String {
    let mut lines = vec![format!(
        "{} ({} to {})",
        week_label(report.week_offset),
        report.week.start,
        report.week.end
    )];
    for day in &report.week.days {
        lines.push(format!(
            "  {} {}  {}",
            day.date.format("%a"),
            day.date,
            format_duration(day.total_seconds)
        ));
    }
    lines.push(format!(
        "Total: {}  Daily average: {}",
        format_duration(report.week.total_seconds),
        format_duration(report.week.average_seconds)
    ));
    lines.push(format!("Streak: {} day(s)", report.current_streak));
    lines.push(format!(
        "Total focus: {}",
        format_duration(report.total_focus_time)
    ));
    lines.join("\n")
}

pub(crate) fn render_history(history: &TopicHistory, days: &DayPolicy) -> String {
    if history.session_count == 0 {
        return format!("No sessions for \"{}\".", history.topic);
    }

    let mut lines = vec![format!(
        "{}: {} in {} session(s)",
        history.topic,
        format_duration(history.total_seconds),
        history.session_count
    )];
    for day in &history.days {
        lines.push(day.date.format("%a %Y-%m-%d").to_string());
        for session in &day.sessions {
            lines.push(format!("  {}", render_session_line(session, days)));
        }
    }
    lines.join("\n")
}
