//! Adapter between a room subscription and the alert queue.

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::{
    alerts::AlertProducer,
    channel::{MessageError, RawMessage, Transport},
};

/// Listens to one room and feeds its celebrations into the alert queue.
///
/// The adapter only ever appends to the queue. Unrecognized and malformed
/// pushes are dropped on the spot; they never reach the queue nor surface as
/// errors.
///
/// # Examples
///
/// ```no_run
/// use alertcast::{alerts::alert_queue, channel::{ChannelAdapter, HttpTransport}};
/// use tokio::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let (producer, _consumer) = alert_queue();
/// let transport = HttpTransport::new("http://localhost:8080", Duration::from_secs(2), Duration::from_secs(60));
/// ChannelAdapter::join(transport, "ana", producer).await?.run().await;
/// # Ok(())
/// # }
/// ```
pub struct ChannelAdapter<T: Transport> {
    /// Subscription to the real-time channel
    transport: T,
    /// Room to listen to, the streamer's channel name
    room: String,
    /// Tail of the alert queue
    producer: AlertProducer,
}

impl<T: Transport> ChannelAdapter<T> {
    /// Subscribes `transport` to `room`, ready to feed `producer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot join the room. Nothing has
    /// been subscribed in that case.
    pub async fn join(mut transport: T, room: &str, producer: AlertProducer) -> Result<Self> {
        transport
            .join(room)
            .await
            .with_context(|| format!("failed to join room {}", room))?;

        Ok(ChannelAdapter {
            transport,
            room: room.to_owned(),
            producer,
        })
    }

    /// Enqueues alerts until the subscription ends.
    ///
    /// Returns when the transport has nothing more to deliver or when the
    /// queue consumer is gone. Dropping the future drops the transport, and
    /// with it the subscription, so no message is handled after an abort.
    pub async fn run(mut self) {
        while let Some(message) = self.transport.next_message().await {
            if !self.handle_message(&message) {
                debug!("alert queue closed for room {}", self.room);
                break;
            }
        }

        info!("stopped listening to room {}", self.room);
        self.transport.leave();
    }

    /// Normalizes one push and enqueues it when it is a celebration.
    ///
    /// Returns `false` when the queue no longer accepts alerts.
    fn handle_message(&self, message: &RawMessage) -> bool {
        match message.normalize() {
            Ok(alert) => {
                info!("queued alert {} for room {}", alert, self.room);
                self.producer.enqueue(alert)
            }
            Err(MessageError::Unrecognized(kind)) => {
                debug!("ignoring {} message in room {}", kind, self.room);
                true
            }
            Err(err) => {
                warn!("dropping message in room {}: {}", self.room, err);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alerts::{AlertKind, alert_queue},
        channel::{GIFT_SENT, LEVEL_UP, MockTransport},
    };
    use anyhow::anyhow;
    use mockall::predicate::eq;
    use serde_json::json;
    use std::collections::VecDeque;

    fn mock_transport(messages: Vec<RawMessage>) -> MockTransport {
        let mut transport = MockTransport::new();
        let mut messages = VecDeque::from(messages);

        transport
            .expect_join()
            .with(eq("ana"))
            .times(1)
            .returning(|_| Ok(()));
        transport
            .expect_next_message()
            .returning(move || messages.pop_front());
        transport.expect_leave().times(1).return_const(());

        transport
    }

    #[tokio::test]
    async fn test_run_enqueues_celebrations_in_order() {
        let transport = mock_transport(vec![
            RawMessage::new(GIFT_SENT, json!({"spectatorUsername": "ana", "giftName": "Taco"})),
            RawMessage::new("newMessage", json!({"text": "hello"})),
            RawMessage::new(LEVEL_UP, json!({"username": "bob", "newLevel": 3})),
            RawMessage::new(GIFT_SENT, json!({"spectatorUsername": "carl", "giftName": "Rose"})),
        ]);
        let (producer, mut consumer) = alert_queue();

        ChannelAdapter::join(transport, "ana", producer)
            .await
            .unwrap()
            .run()
            .await;

        let first = consumer.pop_front().unwrap();
        assert_eq!(first.kind(), AlertKind::Gift);
        assert_eq!(first.actor(), "ana");
        let second = consumer.pop_front().unwrap();
        assert_eq!(second.kind(), AlertKind::LevelUp);
        assert_eq!(second.detail(), "Level 3");
        let third = consumer.pop_front().unwrap();
        assert_eq!(third.actor(), "carl");
        assert!(consumer.pop_front().is_none());
    }

    #[tokio::test]
    async fn test_run_drops_malformed_messages() {
        let transport = mock_transport(vec![
            RawMessage::new(GIFT_SENT, json!({"spectatorUsername": "ana"})),
            RawMessage::new(LEVEL_UP, json!({"username": "bob"})),
            RawMessage::new(LEVEL_UP, json!({"username": "bob", "newLevel": 4})),
        ]);
        let (producer, mut consumer) = alert_queue();

        ChannelAdapter::join(transport, "ana", producer)
            .await
            .unwrap()
            .run()
            .await;

        assert_eq!(consumer.len(), 1);
        assert_eq!(consumer.pop_front().unwrap().detail(), "Level 4");
    }

    #[tokio::test]
    async fn test_run_keeps_duplicates() {
        let gift = RawMessage::new(GIFT_SENT, json!({"spectatorUsername": "ana", "giftName": "Taco"}));
        let transport = mock_transport(vec![gift.clone(), gift]);
        let (producer, mut consumer) = alert_queue();

        ChannelAdapter::join(transport, "ana", producer)
            .await
            .unwrap()
            .run()
            .await;

        assert_eq!(consumer.len(), 2);
    }

    #[tokio::test]
    async fn test_join_failure_is_reported() {
        let mut transport = MockTransport::new();
        transport
            .expect_join()
            .times(1)
            .returning(|_| Err(anyhow!("invalid url")));
        transport.expect_next_message().times(0);
        transport.expect_leave().times(0);
        let (producer, mut consumer) = alert_queue();

        let err = ChannelAdapter::join(transport, "ana", producer)
            .await
            .err()
            .unwrap();

        assert!(err.to_string().contains("ana"));
        assert!(consumer.is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_when_queue_closed() {
        let mut transport = MockTransport::new();
        transport.expect_join().returning(|_| Ok(()));
        transport.expect_next_message().times(1).returning(|| {
            Some(RawMessage::new(
                GIFT_SENT,
                json!({"spectatorUsername": "ana", "giftName": "Taco"}),
            ))
        });
        transport.expect_leave().times(1).return_const(());
        let (producer, consumer) = alert_queue();
        drop(consumer);

        ChannelAdapter::join(transport, "ana", producer)
            .await
            .unwrap()
            .run()
            .await;
    }
}
