//! Overlay lifecycle for a broadcaster's room.
//!
//! This module provides the [`Overlay`] which wires the channel adapter, the
//! alert queue, the scheduler and the render surface together for one room,
//! and tears them down again.
//!
//! # Architecture
//!
//! A mounted overlay runs three tasks:
//!
//! 1. **Adapter Task**: Listens to the room and appends alerts to the queue
//! 2. **Scheduler Task**: Presents queued alerts one at a time and publishes
//!    every state it reaches
//! 3. **Presenter Task**: Renders each published state onto the surface
//!
//! ```text
//! Transport → ChannelAdapter → queue → AlertScheduler → watch → present_frames → Surface
//! ```
//!
//! # Teardown
//!
//! [`Overlay::unmount`] only returns once the adapter and scheduler tasks are
//! gone. Messages still in flight and timers still running are dropped with
//! them, so a torn down overlay never changes state again and a remount
//! always starts from an empty queue and an idle scheduler.

use anyhow::{Result, anyhow, bail};
use log::{error, info};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    alerts::{AlertScheduler, SchedulerState, Timings, alert_queue, run_scheduler},
    channel::{ChannelAdapter, Transport},
    surface::{Surface, present_frames},
};

/// Tasks serving one mounted room.
struct Mount<S> {
    /// Room the overlay listens to
    room: String,
    adapter: JoinHandle<()>,
    scheduler: JoinHandle<()>,
    /// Hands the surface back once the scheduler is gone
    presenter: JoinHandle<S>,
}

/// Alert overlay bound to at most one room at a time.
///
/// # Examples
///
/// ```no_run
/// use alertcast::{
///     alerts::Timings,
///     channel::HttpTransport,
///     overlay::Overlay,
///     surface::JsonLinesSurface,
/// };
/// use tokio::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let mut overlay = Overlay::new(Timings::default(), JsonLinesSurface::new(std::io::stdout()));
/// let transport = HttpTransport::new("http://localhost:3000", Duration::from_secs(2), Duration::from_secs(60));
///
/// overlay.mount("ana", transport).await?;
/// // ... alerts are presented ...
/// overlay.unmount().await;
/// # Ok(())
/// # }
/// ```
pub struct Overlay<S: Surface + 'static> {
    /// Show and exit durations of every alert
    timings: Timings,
    /// Render surface, `None` while lent to a presenter task
    surface: Option<S>,
    mount: Option<Mount<S>>,
}

impl<S: Surface + 'static> Overlay<S> {
    pub fn new(timings: Timings, surface: S) -> Self {
        Overlay {
            timings,
            surface: Some(surface),
            mount: None,
        }
    }

    /// Room currently mounted, if any.
    pub fn room(&self) -> Option<&str> {
        self.mount.as_ref().map(|mount| mount.room.as_str())
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_some()
    }

    /// Starts presenting the alerts of `room`, received through `transport`.
    ///
    /// The room is joined before any task is started, so a failed join
    /// leaves the overlay unmounted.
    ///
    /// # Errors
    ///
    /// Returns an error if the overlay is already mounted (use
    /// [`Self::switch_room`]), if the render surface was lost by a failed
    /// presenter task, or if the transport cannot join the room.
    pub async fn mount<T: Transport + 'static>(&mut self, room: &str, transport: T) -> Result<()> {
        if let Some(mount) = &self.mount {
            bail!("overlay already mounted for room {}", mount.room);
        }
        if self.surface.is_none() {
            bail!("render surface is not available");
        }

        let (producer, consumer) = alert_queue();
        let adapter = ChannelAdapter::join(transport, room, producer).await?;
        let surface = self
            .surface
            .take()
            .ok_or_else(|| anyhow!("render surface is not available"))?;

        info!(
            "mounting overlay for room {} (show {}ms, exit {}ms)",
            room,
            self.timings.show.as_millis(),
            self.timings.exit.as_millis()
        );

        let (snapshots, snapshot_rx) = watch::channel(SchedulerState::Idle);

        let presenter = tokio::spawn(present_frames(surface, snapshot_rx, self.timings.show));
        let scheduler = tokio::spawn(run_scheduler(
            AlertScheduler::new(self.timings),
            consumer,
            snapshots,
        ));
        let adapter = tokio::spawn(adapter.run());

        self.mount = Some(Mount {
            room: room.to_owned(),
            adapter,
            scheduler,
            presenter,
        });

        Ok(())
    }

    /// Tears the overlay down. Does nothing if it is not mounted.
    ///
    /// The adapter is stopped first so no new alert can be queued, then the
    /// scheduler with its timers, then the presenter clears the surface.
    /// Queued and active alerts are discarded.
    pub async fn unmount(&mut self) {
        let Some(mount) = self.mount.take() else {
            return;
        };
        info!("unmounting overlay from room {}", mount.room);

        mount.adapter.abort();
        if let Err(err) = mount.adapter.await
            && !err.is_cancelled()
        {
            error!("channel adapter task failed: {}", err);
        }

        mount.scheduler.abort();
        if let Err(err) = mount.scheduler.await
            && !err.is_cancelled()
        {
            error!("alert scheduler task failed: {}", err);
        }

        match mount.presenter.await {
            Ok(surface) => self.surface = Some(surface),
            Err(err) => error!("render surface task failed: {}", err),
        }
    }

    /// Moves the overlay to another room, starting from a clean state.
    pub async fn switch_room<T: Transport + 'static>(
        &mut self,
        room: &str,
        transport: T,
    ) -> Result<()> {
        self.unmount().await;
        self.mount(room, transport).await
    }
}
