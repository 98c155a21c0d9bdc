//! Command-line commands
//!
//! Thin presentation layer over the session store: every command opens the
//! store, issues one intent and renders the result as text or JSON.

mod manage;
mod stats;
mod timer;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::analytics::MAX_WEEK_OFFSET;
use crate::config::Settings;
use crate::error::AppError;
use crate::models::SessionId;
use crate::storage::Database;
use crate::store::{SessionStore, SharedStore, StoreOptions};

pub use manage::{delete, rename};
pub use stats::{history, stats, today, topics};
pub use timer::{start, status, stop, watch};

/// Pulse focus timer
#[derive(Debug, Parser)]
#[command(name = "pulse", version, about = "Track focus sessions by topic")]
pub struct Cli {
    /// Data directory holding settings.yaml and the database
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a session on a topic
    #[command(visible_alias = "continue")]
    Start {
        /// Topic words, joined with spaces
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
    },

    /// Stop the running session
    Stop,

    /// Show the timer and today's figures
    Status,

    /// Follow the running timer until Ctrl-C; the session stays open
    Watch,

    /// List today's sessions
    Today,

    /// Weekly totals and streak
    Stats {
        /// Weeks back from the current week
        #[arg(
            long,
            default_value_t = 0,
            value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_WEEK_OFFSET))
        )]
        week: u32,
    },

    /// Sessions of one topic, grouped by day
    History {
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
    },

    /// All topics with their totals
    Topics,

    /// Rename a topic on every session
    Rename { old: String, new: String },

    /// Delete a session by id
    Delete { id: SessionId },
}

impl Cli {
    /// Directory used for settings and data
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(Settings::default_data_dir)
    }
}

/// State shared by every command
pub struct CommandContext {
    pub store: SharedStore,
    pub settings: Settings,
    pub json: bool,
}

impl CommandContext {
    /// Open the database and the store under `data_dir`
    pub fn open(data_dir: &Path, settings: Settings, json: bool) -> Result<Self, AppError> {
        fs::create_dir_all(data_dir)?;

        let db_path = settings.database_path(data_dir);
        debug!(path = %db_path.display(), "Opening database");
        let db = Database::new(&db_path)?.into_shared();

        let store = SessionStore::open(db, StoreOptions::from(&settings), Utc::now())?;

        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            settings,
            json,
        })
    }

    /// Print a value as pretty JSON
    pub(crate) fn print_json<T: Serialize>(&self, value: &T) -> Result<(), AppError> {
        let rendered = serde_json::to_string_pretty(value)
            .map_err(|e| AppError::internal(format!("failed to serialize output: {e}")))?;
        println!("{rendered}");
        Ok(())
    }
}

/// Run one command to completion
pub async fn execute(command: Command, ctx: &CommandContext) -> Result<(), AppError> {
    match command {
        Command::Start { topic } => start(ctx, &topic.join(" ")).await,
        Command::Stop => stop(ctx).await,
        Command::Status => status(ctx).await,
        Command::Watch => watch(ctx).await,
        Command::Today => today(ctx).await,
        Command::Stats { week } => stats(ctx, week).await,
        Command::History { topic } => history(ctx, &topic.join(" ")).await,
        Command::Topics => topics(ctx).await,
        Command::Rename { old, new } => rename(ctx, &old, &new).await,
        Command::Delete { id } => delete(ctx, id).await,
    }
}
