//! Output side of the render surface.
//!
//! This module provides the [`Surface`] trait frames are handed to, the
//! [`JsonLinesSurface`] used by the capture tooling, and the
//! [`present_frames`] task that keeps a surface in sync with the scheduler.

use std::io::{self, Write};

use log::{debug, error};
use mockall::automock;
use tokio::{sync::watch, time::Duration};

use crate::{
    alerts::SchedulerState,
    surface::{AlertCard, render},
};

/// Destination of rendered frames.
///
/// `None` is an empty frame: nothing must be drawn.
#[automock]
pub trait Surface: Send {
    fn present(&mut self, card: Option<AlertCard>) -> io::Result<()>;
}

/// Writes one JSON document per frame, `null` for an empty frame.
///
/// # Examples
///
/// ```no_run
/// use alertcast::surface::{JsonLinesSurface, Surface};
///
/// let mut surface = JsonLinesSurface::new(std::io::stdout());
/// surface.present(None).unwrap(); // prints `null`
/// ```
pub struct JsonLinesSurface<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSurface<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSurface { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Surface for JsonLinesSurface<W> {
    fn present(&mut self, card: Option<AlertCard>) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, &card)?;
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

/// Renders every scheduler snapshot onto `surface`, with `show` as the
/// visible duration carried by each card.
///
/// Runs until the snapshot sender is dropped, which happens when the
/// scheduler task ends or is aborted. The surface is then cleared and handed
/// back so the next mount can reuse it. Presentation errors are logged and
/// never stop the loop.
pub async fn present_frames<S: Surface>(
    mut surface: S,
    mut snapshots: watch::Receiver<SchedulerState>,
    show: Duration,
) -> S {
    loop {
        let card = render(&snapshots.borrow_and_update(), show);
        match &card {
            Some(card) => debug!("presenting {}", card),
            None => debug!("presenting empty frame"),
        }
        if let Err(err) = surface.present(card) {
            error!("failed to present frame: {}", err);
        }

        if snapshots.changed().await.is_err() {
            break;
        }
    }

    if let Err(err) = surface.present(None) {
        error!("failed to clear surface: {}", err);
    }

    surface
}
