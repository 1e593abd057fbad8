//! Server pushes and their normalization into alerts.
//!
//! The real-time channel pushes many kinds of messages into a room (chat
//! lines, loyalty updates, ...). Only two of them are celebrations:
//!
//! - `newGift`: `{ spectatorUsername, giftName, timestamp }`
//! - `levelUp`: `{ username, newLevel, timestamp }`
//!
//! [`RawMessage::normalize`] turns those into [`AlertEvent`]s and reports
//! everything else as a [`MessageError`].

use std::fmt;

use serde::Deserialize;

use crate::alerts::AlertEvent;

/// Discriminator of the "gift sent" push.
pub const GIFT_SENT: &str = "newGift";
/// Discriminator of the "level up" push.
pub const LEVEL_UP: &str = "levelUp";

/// A heterogeneous message pushed by the server into a room.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    /// Message type
    pub event: String,
    /// JSON payload, shape depends on `event`
    pub data: serde_json::Value,
}

/// Payload of a `newGift` push.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GiftSentPayload {
    spectator_username: String,
    gift_name: String,
}

/// Payload of a `levelUp` push.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelUpPayload {
    username: String,
    new_level: u64,
}

/// Reasons a pushed message does not become an alert.
///
/// Neither variant is a failure of the overlay: both end with the message
/// being dropped.
#[derive(Debug, PartialEq)]
pub enum MessageError {
    /// The message is not a celebration (chat line, loyalty update, ...)
    Unrecognized(String),
    /// A celebration whose payload lacks a required field
    Malformed {
        /// Message type
        kind: String,
        /// Deserialization error
        reason: String,
    },
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MessageError::Unrecognized(kind) => write!(f, "unrecognized message type {}", kind),
            MessageError::Malformed { kind, reason } => {
                write!(f, "malformed {} message: {}", kind, reason)
            }
        }
    }
}

impl std::error::Error for MessageError {}

impl RawMessage {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        RawMessage {
            event: event.into(),
            data,
        }
    }

    /// Converts a celebration push into a fresh [`AlertEvent`].
    ///
    /// Each successful call allocates a new alert id, so the same push
    /// normalized twice yields two distinct alerts.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use alertcast::channel::RawMessage;
    /// use serde_json::json;
    ///
    /// let message = RawMessage::new("levelUp", json!({"username": "ana", "newLevel": 3}));
    /// assert_eq!(message.normalize().unwrap().detail(), "Level 3");
    /// ```
    pub fn normalize(&self) -> Result<AlertEvent, MessageError> {
        match self.event.as_str() {
            GIFT_SENT => {
                let payload = GiftSentPayload::deserialize(&self.data)
                    .map_err(|err| self.malformed(err))?;
                Ok(AlertEvent::gift(payload.spectator_username, payload.gift_name))
            }
            LEVEL_UP => {
                let payload =
                    LevelUpPayload::deserialize(&self.data).map_err(|err| self.malformed(err))?;
                Ok(AlertEvent::level_up(payload.username, payload.new_level))
            }
            other => Err(MessageError::Unrecognized(other.to_owned())),
        }
    }

    fn malformed(&self, err: serde_json::Error) -> MessageError {
        MessageError::Malformed {
            kind: self.event.clone(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;
    use serde_json::json;

    #[test]
    fn test_normalize_gift() {
        let message = RawMessage::new(
            GIFT_SENT,
            json!({"spectatorUsername": "ana", "giftName": "Taco", "timestamp": "2024-05-01T10:00:00Z"}),
        );

        let alert = message.normalize().unwrap();
        assert_eq!(alert.kind(), AlertKind::Gift);
        assert_eq!(alert.actor(), "ana");
        assert_eq!(alert.detail(), "Taco");
        assert_eq!(alert.icon(), "🎁");
    }

    #[test]
    fn test_normalize_level_up() {
        let message = RawMessage::new(
            LEVEL_UP,
            json!({"username": "ana", "newLevel": 3, "timestamp": "2024-05-01T10:00:00Z"}),
        );

        let alert = message.normalize().unwrap();
        assert_eq!(alert.kind(), AlertKind::LevelUp);
        assert_eq!(alert.actor(), "ana");
        assert_eq!(alert.detail(), "Level 3");
        assert_eq!(alert.icon(), "⭐");
    }

    #[test]
    fn test_timestamp_is_optional() {
        let message = RawMessage::new(GIFT_SENT, json!({"spectatorUsername": "ana", "giftName": "Taco"}));
        assert!(message.normalize().is_ok());
    }

    #[test]
    fn test_gift_without_gift_name_is_malformed() {
        let message = RawMessage::new(GIFT_SENT, json!({"spectatorUsername": "ana"}));

        match message.normalize() {
            Err(MessageError::Malformed { kind, reason }) => {
                assert_eq!(kind, GIFT_SENT);
                assert!(reason.contains("giftName"));
            }
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[test]
    fn test_level_up_without_new_level_is_malformed() {
        let message = RawMessage::new(LEVEL_UP, json!({"username": "ana"}));

        assert!(matches!(
            message.normalize(),
            Err(MessageError::Malformed { .. })
        ));
    }

    #[test]
    fn test_level_up_with_non_numeric_level_is_malformed() {
        let message = RawMessage::new(LEVEL_UP, json!({"username": "ana", "newLevel": "three"}));

        assert!(matches!(
            message.normalize(),
            Err(MessageError::Malformed { .. })
        ));
    }

    #[test]
    fn test_non_object_payload_is_malformed() {
        let message = RawMessage::new(GIFT_SENT, json!("Taco"));

        assert!(matches!(
            message.normalize(),
            Err(MessageError::Malformed { .. })
        ));
    }

    #[test]
    fn test_chat_message_is_unrecognized() {
        let message = RawMessage::new("newMessage", json!({"text": "hello"}));

        assert_eq!(
            message.normalize(),
            Err(MessageError::Unrecognized("newMessage".to_owned()))
        );
    }

    #[test]
    fn test_error_display() {
        let err = MessageError::Unrecognized("newMessage".to_owned());
        assert_eq!(err.to_string(), "unrecognized message type newMessage");

        let err = MessageError::Malformed {
            kind: "newGift".to_owned(),
            reason: "missing field `giftName`".to_owned(),
        };
        assert_eq!(err.to_string(), "malformed newGift message: missing field `giftName`");
    }
}
