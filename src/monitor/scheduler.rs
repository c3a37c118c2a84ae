//! Freshness bookkeeping and the idle / active-polling state machine.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::info;

/// Whether periodic reconciliation is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No change subscriber and no timer.
    Idle,
    /// At least one change subscriber; a timer reconciles once per max age.
    ActivePolling,
}

/// Decides when reconciliation is due.
///
/// Holds no timer itself. The engine spawns the timer task when
/// [`Scheduler::add_subscriber`] hands out a cancel handle and the handle
/// is notified once [`Scheduler::remove_subscriber`] returns it.
#[derive(Debug)]
pub struct Scheduler {
    max_age: Duration,
    last_success: Option<Instant>,
    subscribers: usize,
    timer: Option<Arc<Notify>>,
}

impl Scheduler {
    /// Creates an idle scheduler that considers state stale until the first pass.
    #[must_use]
    pub const fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            last_success: None,
            subscribers: 0,
            timer: None,
        }
    }

    /// Returns the configured maximum state age.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        if self.subscribers == 0 {
            SchedulerState::Idle
        } else {
            SchedulerState::ActivePolling
        }
    }

    /// Returns the number of live change subscribers.
    #[must_use]
    pub const fn subscribers(&self) -> usize {
        self.subscribers
    }

    /// Returns true when no successful pass happened within `max_age` of `now`.
    #[must_use]
    pub fn is_stale(&self, now: Instant) -> bool {
        self.last_success
            .is_none_or(|last| now.saturating_duration_since(last) >= self.max_age)
    }

    /// Records a successful pass whose interfaces were read at `at`.
    pub fn mark_refreshed(&mut self, at: Instant) {
        self.last_success = Some(self.last_success.map_or(at, |last| last.max(at)));
    }

    /// Returns when the next pass is due, never earlier than `now`.
    #[must_use]
    pub fn next_due(&self, now: Instant) -> Instant {
        self.last_success
            .map_or(now, |last| (last + self.max_age).max(now))
    }

    /// Registers a change subscriber.
    ///
    /// Returns a fresh cancel handle on the idle to active-polling
    /// transition; the caller must start the timer with it.
    pub fn add_subscriber(&mut self) -> Option<Arc<Notify>> {
        self.subscribers += 1;
        if self.subscribers > 1 {
            return None;
        }
        info!(max_age_ms = self.max_age.as_millis(), "Change subscriber attached, polling started");
        let cancel = Arc::new(Notify::new());
        self.timer = Some(Arc::clone(&cancel));
        Some(cancel)
    }

    /// Unregisters a change subscriber.
    ///
    /// Returns the timer's cancel handle on the transition back to idle.
    pub fn remove_subscriber(&mut self) -> Option<Arc<Notify>> {
        self.subscribers = self.subscribers.saturating_sub(1);
        if self.subscribers > 0 {
            return None;
        }
        let cancel = self.timer.take()?;
        info!("Last change subscriber detached, polling stopped");
        Some(cancel)
    }
}

/// Keeps one change subscriber registered for as long as it lives.
///
/// Dropping the last subscription cancels the polling timer.
#[derive(Debug)]
pub struct Subscription {
    scheduler: Arc<Mutex<Scheduler>>,
}

impl Subscription {
    pub(crate) const fn new(scheduler: Arc<Mutex<Scheduler>>) -> Self {
        Self { scheduler }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let cancel = self
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove_subscriber();
        if let Some(cancel) = cancel {
            cancel.notify_one();
        }
    }
}
