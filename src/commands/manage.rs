//! Session management commands

use chrono::Utc;
use serde_json::json;

use crate::error::AppError;
use crate::models::SessionId;

use super::CommandContext;

/// Rename a topic on every session, the running one included
pub async fn rename(ctx: &CommandContext, old: &str, new: &str) -> Result<(), AppError> {
    let renamed = ctx
        .store
        .lock()
        .await
        .rename_topic(old, new, Utc::now())?;

    if ctx.json {
        return ctx.print_json(&json!({ "renamed": renamed }));
    }
    println!("Renamed {renamed} session(s) from \"{old}\" to \"{}\"", new.trim());
    Ok(())
}

/// Delete one session; an unknown id is reported, not an error
pub async fn delete(ctx: &CommandContext, id: SessionId) -> Result<(), AppError> {
    let deleted = ctx.store.lock().await.delete_session(id, Utc::now())?;

    if ctx.json {
        return ctx.print_json(&json!({ "id": id, "deleted": deleted }));
    }
    if deleted {
        println!("Deleted session {id}");
    } else {
        println!("No session {id}");
    }
    Ok(())
}
