//! Tick driver
//!
//! A tokio task that advances the running timer on a fixed period. The task
//! is owned through a [`TickHandle`]; stopping or dropping the handle ends the
//! loop but never closes the open session.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use super::SessionStore;

/// Store shared between presentation code and the tick driver
pub type SharedStore = Arc<Mutex<SessionStore>>;

/// Control handle for a running tick task
pub struct TickHandle {
    /// Shutdown signal sender
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// Signal the task and wait for it to exit
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Spawns tick tasks
pub struct TickDriver;

impl TickDriver {
    /// Tick the store every `period` using the system clock
    pub fn spawn(store: SharedStore, period: Duration) -> TickHandle {
        Self::spawn_with_clock(store, period, Utc::now)
    }

    /// Tick the store every `period`, reading the time from `clock`
    ///
    /// Ticks are skipped while the timer is idle. Late ticks are dropped
    /// rather than bursted; elapsed time comes from the clock either way.
    pub fn spawn_with_clock<C>(store: SharedStore, period: Duration, clock: C) -> TickHandle
    where
        C: Fn() -> DateTime<Utc> + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let period = period.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            debug!(period_ms = period.as_millis() as u64, "Tick driver started");
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        let mut store = store.lock().await;
                        if !store.engine().is_running() {
                            continue;
                        }
                        if let Err(e) = store.tick(clock()) {
                            trace!(error = %e, "Tick skipped");
                        }
                    }
                }
            }

            debug!("Tick driver stopped");
        });

        TickHandle {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Holds at most one live tick task
#[derive(Default)]
pub struct TickSlot {
    current: Option<TickHandle>,
}

impl TickSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a tick task, stopping the previous one first
    pub async fn arm(&mut self, handle: TickHandle) {
        if let Some(previous) = self.current.take() {
            previous.stop().await;
        }
        self.current = Some(handle);
    }

    /// Stop the current tick task, if any
    pub async fn disarm(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.stop().await;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.current.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}
