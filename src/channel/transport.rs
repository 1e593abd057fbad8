//! Push-channel transport for room subscriptions.
//!
//! This module provides the [`Transport`] trait the channel adapter reads
//! from, and [`HttpTransport`], its implementation over a server-sent-event
//! stream.
//!
//! # Delivery contract
//!
//! - `join(room)` subscribes to one room; joining again replaces the
//!   subscription.
//! - Delivery is at-most-once. When the stream drops, the transport
//!   reconnects to the same room with exponential backoff. Pushes emitted
//!   while disconnected are lost and never replayed.
//! - `next_message` yields `None` only when no room is joined.

use std::collections::VecDeque;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use mockall::automock;
use reqwest::{Client, Response, Url, header::ACCEPT};
use tokio::time::{Duration, sleep};

use crate::channel::RawMessage;

/// A room-scoped subscription to the real-time channel.
///
/// This trait abstracts the network so the adapter can be tested with mocks.
#[automock]
#[async_trait]
pub trait Transport: Send {
    /// Subscribes to `room`, replacing any previous subscription.
    async fn join(&mut self, room: &str) -> Result<()>;
    /// Waits for the next message pushed into the joined room.
    async fn next_message(&mut self) -> Option<RawMessage>;
    /// Drops the subscription. Nothing is delivered afterwards.
    fn leave(&mut self);
}

/// [`Transport`] reading `GET {url}/rooms/{room}/events` as an event stream.
///
/// # Examples
///
/// ```no_run
/// use alertcast::channel::{HttpTransport, Transport};
/// use tokio::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let mut transport = HttpTransport::new(
///     "https://kickclone-api.onrender.com",
///     Duration::from_secs(2),
///     Duration::from_secs(60),
/// );
/// transport.join("ana").await?;
/// while let Some(message) = transport.next_message().await {
///     println!("{}: {}", message.event, message.data);
/// }
/// # Ok(())
/// # }
/// ```
pub struct HttpTransport {
    /// Base url of the channel server
    url: String,
    /// HTTP client
    client: Client,
    /// First backoff delay after a dropped stream
    reconnect_delay: Duration,
    /// Backoff ceiling
    max_reconnect_delay: Duration,
    /// Delay before the next reconnection attempt
    current_delay: Duration,
    /// Joined room
    room: Option<String>,
    /// Open event stream, if connected
    response: Option<Response>,
    decoder: SseDecoder,
}

impl HttpTransport {
    /// Create a new [HttpTransport].
    ///
    /// # Arguments
    ///
    /// * `url` - Base URL of the channel server, without trailing slash.
    /// * `reconnect_delay` - Backoff before the first reconnection attempt.
    /// * `max_reconnect_delay` - Upper bound of the doubling backoff.
    pub fn new(url: &str, reconnect_delay: Duration, max_reconnect_delay: Duration) -> Self {
        HttpTransport {
            url: url.to_owned(),
            client: Client::new(),
            reconnect_delay,
            max_reconnect_delay,
            current_delay: reconnect_delay,
            room: None,
            response: None,
            decoder: SseDecoder::default(),
        }
    }

    /// Builds the event stream url of `room`, percent-encoding the room name.
    fn room_url(&self, room: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot be used as a base url", self.url))?
            .pop_if_empty()
            .extend(["rooms", room, "events"]);
        Ok(url)
    }

    async fn connect(&self, url: Url) -> Result<Response> {
        debug!("request {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        Ok(response)
    }

    /// Waits for the backoff delay then opens a new stream for `room`.
    async fn reconnect(&mut self, room: &str) {
        sleep(self.current_delay).await;
        self.decoder = SseDecoder::default();

        let result = match self.room_url(room) {
            Ok(url) => self.connect(url).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(response) => {
                info!("reconnected to room {}", room);
                self.response = Some(response);
            }
            Err(err) => {
                self.current_delay = (self.current_delay * 2).min(self.max_reconnect_delay);
                error!(
                    "failed to reconnect to room {} ({}), retrying in {}ms",
                    room,
                    err,
                    self.current_delay.as_millis()
                );
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    /// Subscribes to `room`.
    ///
    /// Fails only when no url can be built for the room. A failed first
    /// connection is logged and retried by [`Self::next_message`].
    async fn join(&mut self, room: &str) -> Result<()> {
        let url = self.room_url(room)?;
        self.leave();
        self.room = Some(room.to_owned());

        info!("joining room {}", room);
        match self.connect(url).await {
            Ok(response) => self.response = Some(response),
            Err(err) => warn!("failed to join room {} ({}), will retry", room, err),
        }

        Ok(())
    }

    async fn next_message(&mut self) -> Option<RawMessage> {
        loop {
            if let Some(message) = self.decoder.next_message() {
                return Some(message);
            }

            let room = self.room.clone()?;

            let Some(response) = self.response.as_mut() else {
                self.reconnect(&room).await;
                continue;
            };

            match response.chunk().await {
                Ok(Some(chunk)) => {
                    self.current_delay = self.reconnect_delay;
                    self.decoder.feed(&chunk);
                }
                Ok(None) => {
                    warn!("event stream for room {} ended", room);
                    self.response = None;
                }
                Err(err) => {
                    warn!("event stream for room {} failed: {}", room, err);
                    self.response = None;
                }
            }
        }
    }

    fn leave(&mut self) {
        if let Some(room) = self.room.take() {
            info!("leaving room {}", room);
        }
        self.response = None;
        self.decoder = SseDecoder::default();
        self.current_delay = self.reconnect_delay;
    }
}

/// Longest event stream line kept in memory, in bytes.
const MAX_LINE_LEN: usize = 64 * 1024;

/// Incremental decoder for `text/event-stream` bodies.
///
/// Lines are `field: value` pairs; `event` sets the message type, `data`
/// lines accumulate the payload and a blank line dispatches the message.
/// Lines starting with `:` are keep-alive comments.
///
/// A line longer than [`MAX_LINE_LEN`] is discarded together with the event
/// it belongs to.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current incomplete line
    buffer: Vec<u8>,
    /// Rest of an oversized line still to be skipped
    skipping_line: bool,
    /// Event with an oversized line, dropped at the next blank line
    skipping_event: bool,
    event: Option<String>,
    data: Vec<String>,
    /// Decoded messages not yet handed out
    ready: VecDeque<RawMessage>,
}

impl SseDecoder {
    /// Feeds a chunk of the body. Chunks may split lines anywhere.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);

        while let Some(position) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=position).collect();
            if self.skipping_line {
                self.skipping_line = false;
                continue;
            }
            if line.len() > MAX_LINE_LEN {
                warn!("dropping event stream line longer than {} bytes", MAX_LINE_LEN);
                self.skipping_event = true;
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            self.process_line(line.trim_end_matches(['\n', '\r']));
        }

        if self.buffer.len() > MAX_LINE_LEN {
            warn!("dropping event stream line longer than {} bytes", MAX_LINE_LEN);
            self.buffer.clear();
            self.skipping_line = true;
            self.skipping_event = true;
        }
    }

    /// Next fully decoded message, oldest first.
    pub fn next_message(&mut self) -> Option<RawMessage> {
        self.ready.pop_front()
    }

    fn process_line(&mut self, line: &str) {
        if line.is_empty() {
            if self.skipping_event {
                self.skipping_event = false;
                self.event = None;
                self.data.clear();
            } else {
                self.dispatch();
            }
            return;
        }
        if self.skipping_event || line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_owned()),
            "data" => self.data.push(value.to_owned()),
            _ => {}
        }
    }

    fn dispatch(&mut self) {
        let event = self.event.take().unwrap_or_else(|| "message".to_owned());
        if self.data.is_empty() {
            return;
        }
        let data = self.data.join("\n");
        self.data.clear();

        match serde_json::from_str(&data) {
            Ok(value) => self.ready.push_back(RawMessage::new(event, value)),
            Err(err) => debug!("dropping {} message with invalid json ({})", event, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BODY: &str = "event: newGift\n\
        data: {\"spectatorUsername\": \"ana\", \"giftName\": \"Taco\"}\n\
        \n\
        : keep-alive\n\
        event: levelUp\n\
        data: {\"username\": \"ana\", \"newLevel\": 3}\n\
        \n";

    fn transport(url: &str) -> HttpTransport {
        HttpTransport::new(url, Duration::from_millis(10), Duration::from_millis(40))
    }

    #[test]
    fn test_decoder_decodes_events() {
        let mut decoder = SseDecoder::default();
        decoder.feed(BODY.as_bytes());

        let gift = decoder.next_message().unwrap();
        assert_eq!(gift.event, "newGift");
        assert_eq!(gift.data, json!({"spectatorUsername": "ana", "giftName": "Taco"}));

        let level_up = decoder.next_message().unwrap();
        assert_eq!(level_up.event, "levelUp");
        assert_eq!(level_up.data["newLevel"], 3);

        assert!(decoder.next_message().is_none());
    }

    #[test]
    fn test_decoder_handles_split_chunks() {
        let mut decoder = SseDecoder::default();
        for chunk in BODY.as_bytes().chunks(7) {
            decoder.feed(chunk);
        }

        assert_eq!(decoder.next_message().unwrap().event, "newGift");
        assert_eq!(decoder.next_message().unwrap().event, "levelUp");
    }

    #[test]
    fn test_decoder_waits_for_blank_line() {
        let mut decoder = SseDecoder::default();
        decoder.feed(b"event: newGift\ndata: {}\n");
        assert!(decoder.next_message().is_none());

        decoder.feed(b"\n");
        assert!(decoder.next_message().is_some());
    }

    #[test]
    fn test_decoder_handles_crlf_and_multiline_data() {
        let mut decoder = SseDecoder::default();
        decoder.feed(b"event: levelUp\r\ndata: {\"username\": \"ana\",\r\ndata: \"newLevel\": 4}\r\n\r\n");

        let message = decoder.next_message().unwrap();
        assert_eq!(message.event, "levelUp");
        assert_eq!(message.data, json!({"username": "ana", "newLevel": 4}));
    }

    #[test]
    fn test_decoder_drops_invalid_json() {
        let mut decoder = SseDecoder::default();
        decoder.feed(b"event: newGift\ndata: not json\n\nevent: levelUp\ndata: {}\n\n");

        assert_eq!(decoder.next_message().unwrap().event, "levelUp");
        assert!(decoder.next_message().is_none());
    }

    #[test]
    fn test_decoder_defaults_event_name() {
        let mut decoder = SseDecoder::default();
        decoder.feed(b"data: {\"text\": \"hi\"}\n\n");

        assert_eq!(decoder.next_message().unwrap().event, "message");
    }

    #[test]
    fn test_decoder_drops_oversized_event() {
        let mut decoder = SseDecoder::default();
        let filler = vec![b'x'; 1024];

        decoder.feed(b"event: newGift\ndata: {\"giftName\": \"");
        for _ in 0..(MAX_LINE_LEN / filler.len() + 2) {
            decoder.feed(&filler);
        }
        assert!(decoder.buffer.len() <= MAX_LINE_LEN);

        decoder.feed(b"\"}\ndata: {}\n\nevent: levelUp\ndata: {\"username\": \"ana\", \"newLevel\": 2}\n\n");

        let message = decoder.next_message().unwrap();
        assert_eq!(message.event, "levelUp");
        assert!(decoder.next_message().is_none());
    }

    #[test]
    fn test_decoder_drops_oversized_line_in_one_chunk() {
        let mut decoder = SseDecoder::default();
        let mut body = b"event: newGift\ndata: ".to_vec();
        body.extend(vec![b'x'; MAX_LINE_LEN + 1]);
        body.extend_from_slice(b"\n\nevent: levelUp\ndata: {}\n\n");

        decoder.feed(&body);

        assert_eq!(decoder.next_message().unwrap().event, "levelUp");
        assert!(decoder.next_message().is_none());
    }

    #[test]
    fn test_room_url_encodes_room() {
        let transport = transport("http://localhost:8080");

        let url = transport.room_url("ana smith").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/rooms/ana%20smith/events");
    }

    #[test]
    fn test_room_url_rejects_invalid_base() {
        let transport = transport("not a url");
        assert!(transport.room_url("ana").is_err());
    }

    #[tokio::test]
    async fn test_next_message_without_room() {
        let mut transport = transport("http://localhost:8080");
        assert!(transport.next_message().await.is_none());
    }

    #[tokio::test]
    async fn test_join_and_receive() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("GET", "/rooms/ana/events")
            .match_header("accept", "text/event-stream")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(BODY)
            .create_async()
            .await;

        let mut transport = transport(&url);
        transport.join("ana").await.unwrap();

        let gift = transport.next_message().await.unwrap();
        assert_eq!(gift.event, "newGift");
        let level_up = transport.next_message().await.unwrap();
        assert_eq!(level_up.event, "levelUp");
    }

    #[tokio::test]
    async fn test_reconnects_after_stream_ends() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/rooms/ana/events")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body("event: newGift\ndata: {\"spectatorUsername\": \"ana\", \"giftName\": \"Taco\"}\n\n")
            .expect(2)
            .create_async()
            .await;

        let mut transport = transport(&url);
        transport.join("ana").await.unwrap();

        assert!(transport.next_message().await.is_some());
        assert!(transport.next_message().await.is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_join_survives_unavailable_server() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("GET", "/rooms/ana/events")
            .with_status(503)
            .create_async()
            .await;

        let mut transport = transport(&url);
        assert!(transport.join("ana").await.is_ok());
        assert!(transport.response.is_none());
    }

    #[tokio::test]
    async fn test_leave_stops_delivery() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        server
            .mock("GET", "/rooms/ana/events")
            .with_status(200)
            .with_body(BODY)
            .create_async()
            .await;

        let mut transport = transport(&url);
        transport.join("ana").await.unwrap();
        transport.leave();

        assert!(transport.next_message().await.is_none());
    }
}
