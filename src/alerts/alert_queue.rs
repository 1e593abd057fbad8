//! Unbounded FIFO of alerts waiting to be presented.
//!
//! The queue is split into a single [`AlertProducer`], owned by the channel
//! adapter, and a single [`AlertConsumer`], owned by the scheduler. Neither
//! half is `Clone`, so the append-only / pop-only discipline is enforced by
//! the types rather than by convention.

use std::collections::VecDeque;

use tokio::sync::mpsc;

use crate::alerts::AlertEvent;

/// Creates an empty queue and returns its two halves.
///
/// # Examples
///
/// ```no_run
/// use alertcast::alerts::{AlertEvent, alert_queue};
///
/// let (producer, mut consumer) = alert_queue();
/// producer.enqueue(AlertEvent::gift("ana", "Taco"));
/// assert_eq!(consumer.pop_front().unwrap().detail(), "Taco");
/// ```
pub fn alert_queue() -> (AlertProducer, AlertConsumer) {
    let (tx, rx) = mpsc::unbounded_channel();

    (
        AlertProducer { tx },
        AlertConsumer {
            rx,
            pending: VecDeque::new(),
        },
    )
}

/// Append-only half of the queue.
#[derive(Debug)]
pub struct AlertProducer {
    tx: mpsc::UnboundedSender<AlertEvent>,
}

impl AlertProducer {
    /// Appends an alert to the tail of the queue.
    ///
    /// Never blocks and never rejects while the consumer is alive. Returns
    /// `false` once the consumer has been dropped, i.e. the overlay was torn
    /// down and the alert was discarded.
    pub fn enqueue(&self, alert: AlertEvent) -> bool {
        self.tx.send(alert).is_ok()
    }
}

/// Consume-from-front half of the queue.
#[derive(Debug)]
pub struct AlertConsumer {
    rx: mpsc::UnboundedReceiver<AlertEvent>,
    /// Alerts already received from the channel, in arrival order
    pending: VecDeque<AlertEvent>,
}

impl AlertConsumer {
    /// Number of alerts waiting.
    pub fn len(&mut self) -> usize {
        self.drain();
        self.pending.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Oldest waiting alert, left in place.
    pub fn peek_front(&mut self) -> Option<&AlertEvent> {
        self.drain();
        self.pending.front()
    }

    /// Removes and returns the oldest waiting alert.
    pub fn pop_front(&mut self) -> Option<AlertEvent> {
        self.drain();
        self.pending.pop_front()
    }

    /// Waits until at least one alert is pending.
    ///
    /// Returns `false` when nothing is pending and the producer is gone, so
    /// nothing will ever arrive. Cancel safe: an alert received while the
    /// future is being dropped is never lost.
    pub async fn wait_for_alert(&mut self) -> bool {
        self.drain();
        if !self.pending.is_empty() {
            return true;
        }

        match self.rx.recv().await {
            Some(alert) => {
                self.pending.push_back(alert);
                true
            }
            None => false,
        }
    }

    /// Moves everything already sent by the producer into `pending`.
    fn drain(&mut self) {
        while let Ok(alert) = self.rx.try_recv() {
            self.pending.push_back(alert);
        }
    }
}
