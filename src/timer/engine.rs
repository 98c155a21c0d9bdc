//! Timer engine

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::TimerError;
use crate::models::{Session, SessionId};
use crate::storage::SessionRepository;

/// Coarse timer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Idle,
    Running,
}

/// Live timer state, lost on restart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimerState {
    pub running: bool,
    /// Empty while idle
    pub topic: String,
    /// Persisted start time of the open session
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: i64,
    /// Open session backing the running timer
    pub session_id: Option<SessionId>,
}

/// What to do with an open session found at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Re-enter `Running`, elapsed re-derived from the start time
    #[default]
    Resume,
    /// Close the session immediately
    Close,
}

/// Crash recovery settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryOptions {
    pub policy: RecoveryPolicy,
    /// Longest span a recovered session is closed with
    pub max_session: Duration,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self {
            policy: RecoveryPolicy::Resume,
            max_session: Duration::hours(12),
        }
    }
}

/// Outcome of startup recovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// No open session was found
    Nothing,
    /// The open session is running again
    Resumed(Session),
    /// The open session was closed
    Closed(Session),
}

/// In-memory timer state machine
///
/// The engine only ever holds the id of the open session it created (or
/// recovered); the repository stays the owner of the record itself.
#[derive(Debug, Default)]
pub struct TimerEngine {
    state: TimerState,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> TimerPhase {
        if self.state.running {
            TimerPhase::Running
        } else {
            TimerPhase::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn elapsed_seconds(&self) -> i64 {
        self.state.elapsed_seconds
    }

    /// Start a session
    ///
    /// # Arguments
    /// * `repo` - Repository the open session is persisted to
    /// * `topic` - Topic, trimmed; must not be empty
    /// * `now` - Start time
    ///
    /// # Returns
    /// The persisted open session. On error the engine stays idle.
    pub fn start<R>(&mut self, repo: &R, topic: &str, now: DateTime<Utc>) -> Result<Session, TimerError>
    where
        R: SessionRepository + ?Sized,
    {
        if self.state.running {
            return Err(TimerError::AlreadyRunning);
        }

        let topic = topic.trim();
        if topic.is_empty() {
            return Err(TimerError::EmptyTopic);
        }

        let session = repo.create_session_at(topic, now)?;
        self.enter_running(&session, now);
        debug!(session_id = session.id, "Timer running");
        Ok(session)
    }

    /// Recompute elapsed seconds from the wall clock
    ///
    /// Elapsed time is always `now - started_at`, so late or skipped ticks
    /// never drift the count.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<i64, TimerError> {
        let started_at = match (self.state.running, self.state.started_at) {
            (true, Some(started_at)) => started_at,
            _ => return Err(TimerError::NotRunning),
        };

        self.state.elapsed_seconds = (now - started_at).num_seconds().max(0);
        Ok(self.state.elapsed_seconds)
    }

    /// Stop the running session
    ///
    /// The engine only returns to idle after the repository closed the
    /// session; on failure it stays running and the error is returned.
    pub fn stop<R>(&mut self, repo: &R, now: DateTime<Utc>) -> Result<Session, TimerError>
    where
        R: SessionRepository + ?Sized,
    {
        let session_id = match (self.state.running, self.state.session_id) {
            (true, Some(id)) => id,
            _ => return Err(TimerError::NotRunning),
        };

        let session = repo.close_session(session_id, now)?;
        self.state = TimerState::default();
        debug!(session_id, "Timer idle");
        Ok(session)
    }

    /// Handle an open session left behind by a previous process
    pub fn recover<R>(
        &mut self,
        repo: &R,
        options: &RecoveryOptions,
        now: DateTime<Utc>,
    ) -> Result<Recovery, TimerError>
    where
        R: SessionRepository + ?Sized,
    {
        if self.state.running {
            return Err(TimerError::AlreadyRunning);
        }

        let Some(open) = repo.get_open_session()? else {
            return Ok(Recovery::Nothing);
        };

        match options.policy {
            RecoveryPolicy::Resume => {
                self.enter_running(&open, now);
                info!(
                    session_id = open.id,
                    elapsed_seconds = self.state.elapsed_seconds,
                    "Resumed open session"
                );
                Ok(Recovery::Resumed(open))
            }
            RecoveryPolicy::Close => {
                let latest = open.start_time + options.max_session;
                let end_time = now.min(latest).max(open.start_time);
                if end_time < now {
                    warn!(session_id = open.id, "Open session exceeded the maximum length; capping");
                }
                let closed = repo.close_session(open.id, end_time)?;
                info!(
                    session_id = closed.id,
                    duration_seconds = closed.duration_seconds,
                    "Closed open session left by previous run"
                );
                Ok(Recovery::Closed(closed))
            }
        }
    }

    /// Follow a topic rename if it hits the running session
    ///
    /// # Returns
    /// Whether the live topic changed
    pub fn rename_live_topic(&mut self, old_topic: &str, new_topic: &str) -> bool {
        if self.state.running && self.state.topic == old_topic {
            self.state.topic = new_topic.trim().to_string();
            true
        } else {
            false
        }
    }

    fn enter_running(&mut self, session: &Session, now: DateTime<Utc>) {
        self.state = TimerState {
            running: true,
            topic: session.topic.clone(),
            started_at: Some(session.start_time),
            elapsed_seconds: (now - session.start_time).num_seconds().max(0),
            session_id: Some(session.id),
        };
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::TimeZone;

    use super::*;
    use crate::error::ErrorKind;
    use crate::storage::{Database, StorageError};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
    }

    /// Database wrapper whose close can be made to fail
    struct FlakyRepository {
        db: Database,
        fail_close: Cell<bool>,
    }

    impl FlakyRepository {
        fn new() -> Self {
            Self {
                db: Database::new_in_memory().unwrap(),
                fail_close: Cell::new(false),
            }
        }
    }

    impl SessionRepository for FlakyRepository {
        fn create_session_at(
            &self,
            topic: &str,
            started_at: DateTime<Utc>,
        ) -> Result<Session, StorageError> {
            self.db.create_session_at(topic, started_at)
        }

        fn close_session(
            &self,
            id: SessionId,
            end_time: DateTime<Utc>,
        ) -> Result<Session, StorageError> {
            if self.fail_close.get() {
                return Err(StorageError::LockError);
            }
            self.db.close_session(id, end_time)
        }

        fn get_open_session(&self) -> Result<Option<Session>, StorageError> {
            self.db.get_open_session()
        }
    }

    #[test]
    fn test_start_tick_stop() {
        let db = Database::new_in_memory().unwrap();
        let mut engine = TimerEngine::new();

        let open = engine.start(&db, "  Deep work ", t0()).unwrap();
        assert_eq!(open.topic, "Deep work");
        assert_eq!(engine.phase(), TimerPhase::Running);
        assert_eq!(engine.state().topic, "Deep work");
        assert_eq!(engine.elapsed_seconds(), 0);

        assert_eq!(engine.tick(t0() + Duration::seconds(1)).unwrap(), 1);
        // A skipped stretch of ticks is caught up in one go
        assert_eq!(engine.tick(t0() + Duration::seconds(95)).unwrap(), 95);

        let closed = engine.stop(&db, t0() + Duration::seconds(100)).unwrap();
        assert_eq!(closed.id, open.id);
        assert_eq!(closed.duration_seconds, 100);
        assert_eq!(engine.phase(), TimerPhase::Idle);
        assert_eq!(engine.state(), &TimerState::default());
    }

    #[test]
    fn test_start_rejects_empty_topic_and_double_start() {
        let db = Database::new_in_memory().unwrap();
        let mut engine = TimerEngine::new();

        let err = engine.start(&db, "   ", t0()).unwrap_err();
        assert!(matches!(err, TimerError::EmptyTopic));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(db.get_open_session().unwrap(), None);

        engine.start(&db, "Rust", t0()).unwrap();
        let err = engine.start(&db, "Go", t0()).unwrap_err();
        assert!(matches!(err, TimerError::AlreadyRunning));
        assert_eq!(engine.state().topic, "Rust");
    }

    #[test]
    fn test_start_surfaces_repository_conflict() {
        let db = Database::new_in_memory().unwrap();
        db.create_session_at("elsewhere", t0()).unwrap();

        let mut engine = TimerEngine::new();
        let err = engine.start(&db, "Rust", t0()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_stop_and_tick_while_idle() {
        let db = Database::new_in_memory().unwrap();
        let mut engine = TimerEngine::new();

        let err = engine.stop(&db, t0()).unwrap_err();
        assert!(matches!(err, TimerError::NotRunning));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(matches!(engine.tick(t0()), Err(TimerError::NotRunning)));
        assert_eq!(db.total_focus_seconds().unwrap(), 0);
    }

    #[test]
    fn test_failed_stop_keeps_running() {
        let repo = FlakyRepository::new();
        let mut engine = TimerEngine::new();
        engine.start(&repo, "Rust", t0()).unwrap();

        repo.fail_close.set(true);
        let err = engine.stop(&repo, t0() + Duration::seconds(30)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(engine.is_running());
        assert!(repo.db.get_open_session().unwrap().is_some());

        repo.fail_close.set(false);
        let closed = engine.stop(&repo, t0() + Duration::seconds(40)).unwrap();
        assert_eq!(closed.duration_seconds, 40);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_recover_nothing() {
        let db = Database::new_in_memory().unwrap();
        let mut engine = TimerEngine::new();
        let outcome = engine.recover(&db, &RecoveryOptions::default(), t0()).unwrap();
        assert_eq!(outcome, Recovery::Nothing);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_recover_resume() {
        let db = Database::new_in_memory().unwrap();
        let open = db.create_session_at("Rust", t0()).unwrap();

        let mut engine = TimerEngine::new();
        let now = t0() + Duration::minutes(7);
        let outcome = engine.recover(&db, &RecoveryOptions::default(), now).unwrap();

        assert_eq!(outcome, Recovery::Resumed(open.clone()));
        assert!(engine.is_running());
        assert_eq!(engine.elapsed_seconds(), 7 * 60);
        assert_eq!(engine.state().session_id, Some(open.id));

        let closed = engine.stop(&db, now + Duration::minutes(3)).unwrap();
        assert_eq!(closed.duration_seconds, 10 * 60);
    }

    #[test]
    fn test_recover_close_caps_duration() {
        let db = Database::new_in_memory().unwrap();
        db.create_session_at("Rust", t0()).unwrap();

        let options = RecoveryOptions {
            policy: RecoveryPolicy::Close,
            max_session: Duration::hours(2),
        };
        let mut engine = TimerEngine::new();
        let outcome = engine
            .recover(&db, &options, t0() + Duration::days(1))
            .unwrap();

        match outcome {
            Recovery::Closed(session) => assert_eq!(session.duration_seconds, 2 * 3600),
            other => panic!("expected Closed, got {other:?}"),
        }
        assert!(!engine.is_running());
        assert_eq!(db.get_open_session().unwrap(), None);
    }

    #[test]
    fn test_recover_close_within_cap_uses_now() {
        let db = Database::new_in_memory().unwrap();
        db.create_session_at("Rust", t0()).unwrap();

        let options = RecoveryOptions {
            policy: RecoveryPolicy::Close,
            ..RecoveryOptions::default()
        };
        let mut engine = TimerEngine::new();
        let outcome = engine
            .recover(&db, &options, t0() + Duration::minutes(45))
            .unwrap();

        assert!(matches!(outcome, Recovery::Closed(s) if s.duration_seconds == 45 * 60));
    }

    #[test]
    fn test_rename_live_topic() {
        let db = Database::new_in_memory().unwrap();
        let mut engine = TimerEngine::new();
        assert!(!engine.rename_live_topic("Rust", "Go"));

        engine.start(&db, "Rust", t0()).unwrap();
        assert!(!engine.rename_live_topic("Python", "Go"));
        assert!(engine.rename_live_topic("Rust", " Go "));
        assert_eq!(engine.state().topic, "Go");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Duration is end minus start no matter how ticks were spaced
            #[test]
            fn prop_duration_independent_of_ticks(
                offsets in proptest::collection::vec(0i64..10_000, 0..30),
                total in 0i64..20_000
            ) {
                let db = Database::new_in_memory().unwrap();
                let mut engine = TimerEngine::new();
                engine.start(&db, "Rust", t0()).unwrap();

                let mut ticks = offsets.clone();
                ticks.sort_unstable();
                for offset in ticks.into_iter().filter(|o| *o <= total) {
                    let elapsed = engine.tick(t0() + Duration::seconds(offset)).unwrap();
                    prop_assert_eq!(elapsed, offset);
                }

                let closed = engine.stop(&db, t0() + Duration::seconds(total)).unwrap();
                let end = closed.end_time.unwrap();
                prop_assert_eq!(closed.duration_seconds, (end - closed.start_time).num_seconds());
                prop_assert_eq!(closed.duration_seconds, total);
            }
        }
    }
}
