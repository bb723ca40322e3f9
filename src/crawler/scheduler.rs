//! Scheduler for recurring crawl cycles
//!
//! This module handles:
//! - Running one cycle immediately on start
//! - Re-reading `fetchInterval` from storage after every cycle
//! - Arming a single timer only once the previous cycle has settled
//! - Stopping cleanly between cycles on shutdown

use crate::crawler::cycle::{lock_storage, parse_positive, CrawlCycle};
use crate::storage::{Storage, CONFIG_FETCH_INTERVAL};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Observable scheduler state
///
/// There is no separate "scheduled" state: between cycles the scheduler is
/// idle with a timer armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Progress shared between the scheduler task and its handle
#[derive(Debug, Default)]
struct Status {
    running: AtomicBool,
    cycles_completed: AtomicU64,
}

/// Drives crawl cycles on a self-rearming timer
#[derive(Debug)]
pub struct Scheduler {
    cycle: Arc<CrawlCycle>,
    default_interval: Duration,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `cycle` - The crawl cycle to repeat; its store supplies `fetchInterval`
    /// * `default_interval` - Used when `fetchInterval` is absent, non-numeric or zero
    pub fn new(cycle: Arc<CrawlCycle>, default_interval: Duration) -> Self {
        Self {
            cycle,
            default_interval,
        }
    }

    /// Reads the delay before the next cycle
    ///
    /// Storage failures fall back to the default so the schedule keeps going.
    pub fn current_interval(&self) -> Duration {
        let stored = lock_storage(self.cycle.storage())
            .and_then(|storage| storage.get_config(CONFIG_FETCH_INTERVAL));

        match stored {
            Ok(value) => {
                let default_ms = u64::try_from(self.default_interval.as_millis()).unwrap_or(u64::MAX);
                Duration::from_millis(parse_positive(value.as_deref(), default_ms))
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read {}, using default {:?}: {}",
                    CONFIG_FETCH_INTERVAL,
                    self.default_interval,
                    e
                );
                self.default_interval
            }
        }
    }

    /// Starts recurring operation on the current tokio runtime
    ///
    /// The first cycle runs immediately. Each following cycle is armed only
    /// after the previous one has completed, successfully or not.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let status = Arc::new(Status::default());

        let task = tokio::spawn(self.run_loop(shutdown_rx, Arc::clone(&status)));

        SchedulerHandle {
            shutdown: shutdown_tx,
            status,
            task,
        }
    }

    async fn run_loop(self, mut shutdown: watch::Receiver<bool>, status: Arc<Status>) {
        tracing::info!("Scheduler started");

        loop {
            status.running.store(true, Ordering::SeqCst);
            let outcome = self.cycle.run().await;
            status.running.store(false, Ordering::SeqCst);
            let completed = status.cycles_completed.fetch_add(1, Ordering::SeqCst) + 1;

            if outcome.is_success() {
                tracing::info!("Cycle {} {}", completed, outcome);
            } else {
                tracing::warn!("Cycle {} {}", completed, outcome);
            }

            let interval = self.current_interval();
            tracing::debug!("Next cycle in {:?}", interval);

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                // A dropped handle also ends the schedule
                _ = shutdown.changed() => {}
            }

            if *shutdown.borrow() || shutdown.has_changed().is_err() {
                break;
            }
        }

        tracing::info!("Scheduler stopped");
    }
}

/// Controls a running scheduler
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    status: Arc<Status>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn state(&self) -> SchedulerState {
        if self.status.running.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Cycles that have fully settled so far
    pub fn cycles_completed(&self) -> u64 {
        self.status.cycles_completed.load(Ordering::SeqCst)
    }

    /// Stops arming new cycles and waits for the task to exit
    ///
    /// A cycle already running is allowed to finish.
    pub async fn shutdown(self) -> Result<(), crate::HotlistError> {
        // Errors only when the task already exited
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| crate::HotlistError::Scheduler(e.to_string()))
    }
}
