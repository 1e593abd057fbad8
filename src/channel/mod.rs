//! Real-time channel integration.
//!
//! This module subscribes the overlay to a room of the push channel and turns
//! the server's heterogeneous messages into alerts:
//!
//! - [`Transport`] / [`HttpTransport`]: Room subscription and delivery contract
//! - [`RawMessage`]: One server push, normalized by [`RawMessage::normalize`]
//! - [`ChannelAdapter`]: Reads the subscription and appends alerts to the queue
//!
//! # Failure handling
//!
//! Nothing here propagates to the scheduler or the surface. Unrecognized and
//! malformed pushes are dropped, and disconnects are healed by the transport
//! without replaying what was missed.

mod adapter;
mod message;
mod transport;

pub use crate::channel::adapter::ChannelAdapter;
pub use crate::channel::message::{MessageError, RawMessage};
pub use crate::channel::transport::{HttpTransport, Transport};

#[cfg(test)]
pub use crate::channel::{
    message::{GIFT_SENT, LEVEL_UP},
    transport::MockTransport,
};
