//! Alert model, queue and presentation scheduler.
//!
//! This module holds everything that happens to an alert between the moment
//! the channel adapter normalizes it and the moment the render surface draws
//! it:
//!
//! - [`AlertEvent`]: One immutable, normalized gift or level-up occurrence
//! - [`alert_queue`]: Unbounded FIFO split into an [`AlertProducer`] and an [`AlertConsumer`]
//! - [`AlertScheduler`]: Single-slot state machine that shows alerts one at a time
//!
//! # Architecture
//!
//! ```text
//! ChannelAdapter ──enqueue──> AlertProducer ┄┄> AlertConsumer ──pop──> AlertScheduler ──watch──> surface
//! ```
//!
//! The scheduler is the only component with passage-of-time behavior; it is
//! driven by [`run_scheduler`], which publishes every [`SchedulerState`] it
//! reaches.

mod alert;
mod alert_queue;
mod alert_scheduler;

pub use crate::alerts::alert::{AlertEvent, AlertId, AlertKind};
pub use crate::alerts::alert_queue::{AlertConsumer, AlertProducer, alert_queue};
pub use crate::alerts::alert_scheduler::{
    AlertScheduler, DEFAULT_EXIT_MS, DEFAULT_SHOW_MS, SchedulerState, Timings, run_scheduler,
};
