//! Session store façade
//!
//! Owns the timer engine, talks to the repository, recomputes derived
//! figures and republishes one consistent snapshot for presentation code.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::analytics::calculator::current_streak;
use crate::config::Settings;
use crate::error::AppError;
use crate::models::{DayPolicy, Session, SessionId};
use crate::storage::{lock_database, SharedDatabase, StorageError};
use crate::timer::{RecoveryOptions, TimerEngine};

/// View consumed by presentation code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreSnapshot {
    /// Startup recovery and first load finished
    pub is_ready: bool,
    /// Message of the last failed intent, cleared by the next success
    pub error: Option<String>,
    pub is_running: bool,
    /// Topic of the running session, empty while idle
    pub topic: String,
    pub elapsed_seconds: i64,
    /// Today's sessions, most recent first
    pub today_sessions: Vec<Session>,
    /// Lifetime focused seconds
    pub total_focus_time: i64,
    /// Consecutive-day streak
    pub current_streak: u32,
}

/// Construction options for the store
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    pub recovery: RecoveryOptions,
    /// Fixed day policy; device-local at read time when `None`
    pub day_policy: Option<DayPolicy>,
}

impl From<&Settings> for StoreOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            recovery: settings.recovery_options(),
            day_policy: settings.day_policy(),
        }
    }
}

/// The store façade
///
/// Constructed once at startup and passed by reference; the database handle
/// is injected so history views can share it for direct queries.
pub struct SessionStore {
    db: SharedDatabase,
    engine: TimerEngine,
    options: StoreOptions,
    publisher: watch::Sender<StoreSnapshot>,
}

impl SessionStore {
    /// Build the store, run crash recovery and load the initial view
    pub fn open(
        db: SharedDatabase,
        options: StoreOptions,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let (publisher, _) = watch::channel(StoreSnapshot::default());
        let mut store = Self {
            db,
            engine: TimerEngine::new(),
            options,
            publisher,
        };

        let recovery = {
            let db = lock_database(&store.db)?;
            store.engine.recover(&*db, &store.options.recovery, now)?
        };
        debug!(?recovery, "Startup recovery finished");

        store.load_sessions(now)?;
        store.load_stats(now)?;
        store.publisher.send_modify(|snapshot| snapshot.is_ready = true);
        store.sync_timer_fields();

        Ok(store)
    }

    /// Receiver for snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.publisher.subscribe()
    }

    /// Current snapshot
    pub fn snapshot(&self) -> StoreSnapshot {
        self.publisher.borrow().clone()
    }

    /// Shared database handle for read/administrative paths
    pub fn database(&self) -> SharedDatabase {
        self.db.clone()
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    /// Day policy for this read
    pub fn day_policy(&self) -> DayPolicy {
        self.options.day_policy.unwrap_or_else(DayPolicy::local)
    }

    /// Refresh today's sessions
    pub fn load_sessions(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        let result = self.query_today_sessions(now);
        let sessions = self.settle(result)?;
        self.publisher
            .send_modify(|snapshot| snapshot.today_sessions = sessions);
        Ok(())
    }

    /// Refresh lifetime total and streak
    pub fn load_stats(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        let result = self.query_stats(now);
        let (total, streak) = self.settle(result)?;
        self.publisher.send_modify(|snapshot| {
            snapshot.total_focus_time = total;
            snapshot.current_streak = streak;
        });
        Ok(())
    }

    /// Start a session and refresh the view
    pub fn start_timer(&mut self, topic: &str, now: DateTime<Utc>) -> Result<Session, AppError> {
        let result = match lock_database(&self.db) {
            Ok(db) => self.engine.start(&*db, topic, now).map_err(AppError::from),
            Err(e) => Err(e.into()),
        };
        let session = self.settle(result)?;

        self.sync_timer_fields();
        self.refresh_after_write(now);
        Ok(session)
    }

    /// Stop the running session and refresh the view
    ///
    /// The close is committed before stats are reloaded. If it fails the
    /// snapshot keeps reporting a running timer.
    pub fn stop_timer(&mut self, now: DateTime<Utc>) -> Result<Session, AppError> {
        let result = match lock_database(&self.db) {
            Ok(db) => self.engine.stop(&*db, now).map_err(AppError::from),
            Err(e) => Err(e.into()),
        };
        let session = self.settle(result)?;

        self.sync_timer_fields();
        self.refresh_after_write(now);
        Ok(session)
    }

    /// Advance the elapsed counter; never touches storage
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<i64, AppError> {
        let elapsed = self.engine.tick(now)?;
        trace!(elapsed_seconds = elapsed, "Tick");
        self.publisher
            .send_modify(|snapshot| snapshot.elapsed_seconds = elapsed);
        Ok(elapsed)
    }

    /// Rename a topic everywhere, including the running session
    pub fn rename_topic(
        &mut self,
        old_topic: &str,
        new_topic: &str,
        now: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        let result = match lock_database(&self.db) {
            Ok(mut db) => db
                .rename_all_sessions_with_topic(old_topic, new_topic)
                .map_err(AppError::from),
            Err(e) => Err(e.into()),
        };
        let renamed = self.settle(result)?;

        if self.engine.rename_live_topic(old_topic, new_topic) {
            self.sync_timer_fields();
        }
        self.refresh_after_write(now);
        Ok(renamed)
    }

    /// Delete a session and refresh the view
    ///
    /// The running session cannot be deleted; stop it first.
    pub fn delete_session(&mut self, id: SessionId, now: DateTime<Utc>) -> Result<bool, AppError> {
        if self.engine.state().session_id == Some(id) {
            let err = StorageError::InvalidInput(format!(
                "session {id} is running; stop it before deleting"
            ));
            return self.settle(Err(err.into()));
        }

        let result = lock_database(&self.db)
            .and_then(|db| db.delete_session(id))
            .map_err(AppError::from);
        let deleted = self.settle(result)?;

        self.refresh_after_write(now);
        Ok(deleted)
    }

    fn query_today_sessions(&self, now: DateTime<Utc>) -> Result<Vec<Session>, AppError> {
        let days = self.day_policy();
        let db = lock_database(&self.db)?;
        let mut sessions = db.list_sessions_for_day(days.today(now), &days)?;
        sessions.reverse();
        Ok(sessions)
    }

    fn query_stats(&self, now: DateTime<Utc>) -> Result<(i64, u32), AppError> {
        let days = self.day_policy();
        let today = days.today(now);
        let db = lock_database(&self.db)?;

        let total = db.total_focus_seconds()?;
        let totals = db.get_all_daily_totals(today, &days)?;

        Ok((total, current_streak(&totals, today)))
    }

    /// Reload after a committed write; a failed reload is reported in the
    /// snapshot but does not undo the write
    fn refresh_after_write(&mut self, now: DateTime<Utc>) {
        if let Err(e) = self.load_sessions(now).and_then(|_| self.load_stats(now)) {
            warn!(error = %e, "View refresh failed after write");
        }
    }

    /// Copy the engine's live fields into the snapshot
    fn sync_timer_fields(&mut self) {
        let state = self.engine.state().clone();
        self.publisher.send_modify(|snapshot| {
            snapshot.is_running = state.running;
            snapshot.topic = state.topic;
            snapshot.elapsed_seconds = state.elapsed_seconds;
        });
    }

    /// Record the outcome of an intent in the snapshot's error field
    fn settle<T>(&mut self, result: Result<T, AppError>) -> Result<T, AppError> {
        match &result {
            Ok(_) => {
                self.publisher
                    .send_if_modified(|snapshot| snapshot.error.take().is_some());
            }
            Err(e) => {
                debug!(error = %e, code = e.code(), "Store intent failed");
                let message = e.to_string();
                self.publisher
                    .send_modify(|snapshot| snapshot.error = Some(message));
            }
        }
        result
    }
}
