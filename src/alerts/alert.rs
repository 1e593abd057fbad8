//! Normalized celebration events displayed by the overlay.
//!
//! This module provides the [`AlertEvent`] struct, the uniform record produced
//! from every recognized channel push, together with its [`AlertKind`] and
//! the opaque [`AlertId`] used to key rendered frames.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::Serialize;

/// Source of process-unique alert identifiers.
static NEXT_ALERT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier assigned to an alert when it is normalized.
///
/// Identifiers are only used to key rendered frames. They never take part in
/// ordering or deduplication: two identical pushes produce two alerts with
/// two different identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AlertId(u64);

impl AlertId {
    /// Allocates the next identifier.
    pub fn next() -> Self {
        AlertId(NEXT_ALERT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of events the overlay knows how to present.
///
/// Adding a kind is a deliberate extension: every `match` on this enum is
/// exhaustive so a new variant cannot be silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertKind {
    /// A viewer sent a virtual gift to the streamer.
    Gift,
    /// A viewer reached a new loyalty level.
    LevelUp,
}

impl AlertKind {
    /// Icon shown next to the alert. Fixed per kind, never server supplied.
    pub fn icon(self) -> &'static str {
        match self {
            AlertKind::Gift => "🎁",
            AlertKind::LevelUp => "⭐",
        }
    }
}

/// One normalized celebration occurrence.
///
/// Alerts are immutable once built: fields are private and only readable
/// through accessors, so neither the queue nor the scheduler can alter an
/// event they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    id: AlertId,
    kind: AlertKind,
    actor: String,
    detail: String,
}

impl AlertEvent {
    /// Builds a gift alert for `sender` offering `gift_name`.
    pub fn gift(sender: impl Into<String>, gift_name: impl Into<String>) -> Self {
        AlertEvent {
            id: AlertId::next(),
            kind: AlertKind::Gift,
            actor: sender.into(),
            detail: gift_name.into(),
        }
    }

    /// Builds a level-up alert for `username` reaching `new_level`.
    pub fn level_up(username: impl Into<String>, new_level: u64) -> Self {
        AlertEvent {
            id: AlertId::next(),
            kind: AlertKind::LevelUp,
            actor: username.into(),
            detail: format!("Level {new_level}"),
        }
    }

    pub fn id(&self) -> AlertId {
        self.id
    }

    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    /// Display name of the user who triggered the event.
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Gift name for gifts, pre-formatted level for level-ups.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn icon(&self) -> &'static str {
        self.kind.icon()
    }
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "id={}, kind={:?}, actor={}, detail={}",
            self.id, self.kind, self.actor, self.detail
        )
    }
}
