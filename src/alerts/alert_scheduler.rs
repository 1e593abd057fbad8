//! Presentation scheduler for queued alerts.
//!
//! This module provides the [`AlertScheduler`] state machine and the
//! [`run_scheduler`] task that drives it with tokio timers.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──(queue not empty)──> Showing(alert) ──(show timer)──> Exiting(alert)
//!   ^                                                               │
//!   └───────────────────────────(exit timer)────────────────────────┘
//! ```
//!
//! Exactly one alert occupies the active slot from the moment it leaves the
//! queue until its exit timer expires. Back in `Idle` the queue is checked
//! again immediately, so a burst of alerts is presented back to back with
//! no gap beyond the exit phase.

use log::{debug, info};
use tokio::{
    sync::watch,
    time::{self, Duration, Instant},
};

use crate::alerts::{AlertConsumer, AlertEvent};

/// Default time an alert stays fully visible.
pub const DEFAULT_SHOW_MS: u64 = 5000;
/// Default duration of the exit transition.
pub const DEFAULT_EXIT_MS: u64 = 500;

/// Fixed durations of the two presentation phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// How long an alert stays visible
    pub show: Duration,
    /// How long the exit animation occupies the slot before the next alert
    pub exit: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            show: Duration::from_millis(DEFAULT_SHOW_MS),
            exit: Duration::from_millis(DEFAULT_EXIT_MS),
        }
    }
}

/// What the active slot currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing is displayed.
    #[default]
    Idle,
    /// The alert is fully visible.
    Showing(AlertEvent),
    /// The alert is done but still animating off screen.
    Exiting(AlertEvent),
}

impl SchedulerState {
    /// Alert occupying the slot, if any.
    pub fn alert(&self) -> Option<&AlertEvent> {
        match self {
            SchedulerState::Idle => None,
            SchedulerState::Showing(alert) | SchedulerState::Exiting(alert) => Some(alert),
        }
    }

    /// Whether the alert should be drawn in its visible pose.
    pub fn is_visible(&self) -> bool {
        matches!(self, SchedulerState::Showing(_))
    }
}

/// Single-slot state machine presenting alerts one at a time.
///
/// The machine never reads a clock: every call receives `now`, which makes it
/// fully deterministic under test. [`run_scheduler`] feeds it real (or
/// paused) tokio time.
#[derive(Debug)]
pub struct AlertScheduler {
    state: SchedulerState,
    /// Expiry of the running show or exit timer
    deadline: Option<Instant>,
    timings: Timings,
}

impl AlertScheduler {
    pub fn new(timings: Timings) -> Self {
        AlertScheduler {
            state: SchedulerState::Idle,
            deadline: None,
            timings,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// When the running timer expires. `None` while idle.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    /// Applies at most one transition and returns whether one happened.
    ///
    /// - `Idle`: pops the oldest queued alert, if any, and starts the show timer.
    ///   This is the only place an alert leaves the queue.
    /// - `Showing`: once the show timer expired, starts the exit timer.
    /// - `Exiting`: once the exit timer expired, releases the slot.
    ///
    /// Call it again until it returns `false` to reach a fixed point.
    pub fn step(&mut self, now: Instant, queue: &mut AlertConsumer) -> bool {
        if self.deadline.is_some_and(|deadline| now < deadline) {
            return false;
        }

        self.state = match std::mem::take(&mut self.state) {
            SchedulerState::Idle => {
                let Some(alert) = queue.pop_front() else {
                    return false;
                };
                info!("showing alert {}", alert);
                self.deadline = Some(now + self.timings.show);
                SchedulerState::Showing(alert)
            }
            SchedulerState::Showing(alert) => {
                debug!("alert {} exiting", alert.id());
                self.deadline = Some(now + self.timings.exit);
                SchedulerState::Exiting(alert)
            }
            SchedulerState::Exiting(alert) => {
                debug!("alert {} done", alert.id());
                self.deadline = None;
                SchedulerState::Idle
            }
        };

        true
    }
}

/// Drives `scheduler` until the queue producer is gone and the slot is free.
///
/// The task only ever suspends on the running timer, or, while idle, on the
/// next queue arrival. Every state reached is published on `snapshots`.
/// Aborting the task cancels both timers: no transition can happen after the
/// abort has been observed.
pub async fn run_scheduler(
    mut scheduler: AlertScheduler,
    mut queue: AlertConsumer,
    snapshots: watch::Sender<SchedulerState>,
) {
    loop {
        while scheduler.step(Instant::now(), &mut queue) {
            snapshots.send_replace(scheduler.state().clone());
        }
        debug!("{} alerts waiting", queue.len());

        match scheduler.deadline() {
            Some(deadline) => time::sleep_until(deadline).await,
            None => {
                if !queue.wait_for_alert().await {
                    debug!("alert channel closed, stopping scheduler");
                    return;
                }
            }
        }
    }
}
