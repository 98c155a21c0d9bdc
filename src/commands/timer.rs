//! Timer commands

use std::io::Write;

use chrono::Utc;

use crate::analytics::calculator::{format_clock, format_duration};
use crate::error::AppError;
use crate::store::{StoreSnapshot, TickDriver, TickSlot};
use crate::timer::TimerError;

use super::CommandContext;

/// Start a session, `pulse start <topic>` or `pulse continue <topic>`
pub async fn start(ctx: &CommandContext, topic: &str) -> Result<(), AppError> {
    let mut store = ctx.store.lock().await;
    let session = store.start_timer(topic, Utc::now())?;

    if ctx.json {
        return ctx.print_json(&session);
    }
    println!("Started \"{}\" (session {})", session.display_topic(), session.id);
    Ok(())
}

/// Stop the running session
pub async fn stop(ctx: &CommandContext) -> Result<(), AppError> {
    let mut store = ctx.store.lock().await;
    let session = store.stop_timer(Utc::now())?;

    if ctx.json {
        return ctx.print_json(&session);
    }
    println!(
        "Stopped \"{}\" after {}",
        session.display_topic(),
        format_duration(session.duration_seconds)
    );
    Ok(())
}

/// Print the current snapshot
pub async fn status(ctx: &CommandContext) -> Result<(), AppError> {
    let mut store = ctx.store.lock().await;
    if store.engine().is_running() {
        store.tick(Utc::now())?;
    }
    let snapshot = store.snapshot();

    if ctx.json {
        return ctx.print_json(&snapshot);
    }
    println!("{}", render_status(&snapshot));
    Ok(())
}

/// Follow the running timer until Ctrl-C
///
/// Only the tick task is stopped on exit; the session stays open.
pub async fn watch(ctx: &CommandContext) -> Result<(), AppError> {
    let mut updates = {
        let store = ctx.store.lock().await;
        if !store.engine().is_running() {
            return Err(TimerError::NotRunning.into());
        }
        store.subscribe()
    };

    let mut slot = TickSlot::new();
    slot.arm(TickDriver::spawn(ctx.store.clone(), ctx.settings.tick_interval()))
        .await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = {
                    let snapshot = updates.borrow_and_update();
                    if !snapshot.is_running {
                        break;
                    }
                    render_clock_line(&snapshot)
                };
                print!("\r{line}");
                stdout.flush()?;
            }
        }
    }

    slot.disarm().await;
    println!();
    println!("Timer left running; `pulse stop` ends the session.");
    Ok(())
}

fn render_clock_line(snapshot: &StoreSnapshot) -> String {
    format!("{}  {}", format_clock(snapshot.elapsed_seconds), snapshot.topic)
}

/// Text form of the status snapshot
pub(crate) fn render_status(snapshot: &StoreSnapshot) -> String {
    let timer = if snapshot.is_running {
        format!("Running: {}", render_clock_line(snapshot))
    } else {
        "Idle".to_string()
    };

    let today: i64 = snapshot
        .today_sessions
        .iter()
        .map(|session| session.duration_seconds)
        .sum();

    let mut lines = vec![
        timer,
        format!(
            "Today: {} in {} session(s)",
            format_duration(today),
            snapshot.today_sessions.len()
        ),
        format!("Streak: {} day(s)", snapshot.current_streak),
        format!("Total focus: {}", format_duration(snapshot.total_focus_time)),
    ];
    if let Some(error) = &snapshot.error {
        lines.push(format!("Last error: {error}"));
    }
    lines.join("\n")
}
