//! Pure mapping from scheduler state to what the overlay draws.

use std::fmt;

use serde::Serialize;
use tokio::time::Duration;

use crate::alerts::{AlertId, AlertKind, SchedulerState};

/// Colors of an alert card, as CSS color names of the capture page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub background: &'static str,
    pub border: &'static str,
    pub title: &'static str,
}

/// Everything the capture surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCard {
    /// Key of the alert, stable across its show and exit frames
    pub id: AlertId,
    pub kind: AlertKind,
    pub icon: &'static str,
    pub title: &'static str,
    pub actor: String,
    /// Word between actor and detail ("sent", "reached")
    pub verb: &'static str,
    pub detail: String,
    /// `true` while showing, `false` during the exit transition
    pub visible: bool,
    /// Configured visible duration, length of the countdown bar
    pub show_ms: u64,
    pub palette: Palette,
}

impl fmt::Display for AlertCard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.icon, self.title, self.actor, self.verb, self.detail
        )?;
        if !self.visible {
            write!(f, " (leaving)")?;
        }
        Ok(())
    }
}

fn title(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Gift => "New Gift!",
        AlertKind::LevelUp => "Level Up!",
    }
}

fn verb(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Gift => "sent",
        AlertKind::LevelUp => "reached",
    }
}

fn palette(kind: AlertKind) -> Palette {
    match kind {
        AlertKind::Gift => Palette {
            background: "indigo",
            border: "gold",
            title: "gold",
        },
        AlertKind::LevelUp => Palette {
            background: "purple",
            border: "mediumslateblue",
            title: "white",
        },
    }
}

/// Renders a scheduler snapshot. `Idle` renders nothing.
///
/// `show` is the configured visible duration. It is copied on the card so
/// the capture page can animate its countdown bar without a timer of its own.
///
/// # Examples
///
/// ```no_run
/// use alertcast::{alerts::{AlertEvent, SchedulerState}, surface::render};
/// use tokio::time::Duration;
///
/// let show = Duration::from_millis(5000);
/// let card = render(&SchedulerState::Showing(AlertEvent::gift("ana", "Taco")), show).unwrap();
/// assert_eq!(card.title, "New Gift!");
/// assert_eq!(card.show_ms, 5000);
/// assert!(render(&SchedulerState::Idle, show).is_none());
/// ```
pub fn render(state: &SchedulerState, show: Duration) -> Option<AlertCard> {
    let alert = state.alert()?;
    let kind = alert.kind();

    Some(AlertCard {
        id: alert.id(),
        kind,
        icon: alert.icon(),
        title: title(kind),
        actor: alert.actor().to_owned(),
        verb: verb(kind),
        detail: alert.detail().to_owned(),
        visible: state.is_visible(),
        show_ms: u64::try_from(show.as_millis()).unwrap_or(u64::MAX),
        palette: palette(kind),
    })
}
