//! Overlay render surface.
//!
//! The surface draws whatever the scheduler currently holds and nothing
//! else: it owns no timer and no queue state.
//!
//! - [`render`]: Pure function from a [`SchedulerState`](crate::alerts::SchedulerState) to an [`AlertCard`]
//! - [`Surface`]: Where frames go; [`JsonLinesSurface`] feeds external capture tooling
//! - [`present_frames`]: Task rendering every scheduler snapshot onto a surface

mod card;
mod writer;

pub use crate::surface::card::{AlertCard, render};
pub use crate::surface::writer::{JsonLinesSurface, Surface, present_frames};
