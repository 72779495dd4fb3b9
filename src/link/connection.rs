//! The outbound WebSocket link.
//!
//! # Responsibilities
//! - Perform the client handshake within a deadline
//! - Serialize concurrent writers onto one sink
//! - Translate inbound frames into [`Received`] values
//! - Run the close handshake exactly once
//!
//! # States
//! ```text
//! Disconnected → Connecting → Connected → Closing → Disconnected
//!                                 │                      ▲
//!                                 └── peer close/error ──┘
//! ```
//!
//! A [`Link`] value exists only once the handshake has succeeded, so a stored
//! state starts at `Connected`. `Connecting` covers the handshake inside
//! [`Link::connect`] and is only reported in logs.

use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

use crate::config::TimeoutConfig;
use crate::link::error::LinkError;
use crate::link::message::{Closure, Message, Received};

/// Write half of a WebSocket transport.
pub type FrameSink = Pin<Box<dyn Sink<WsMessage, Error = WsError> + Send>>;

/// Read half of a WebSocket transport.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<WsMessage, WsError>> + Send>>;

/// Link lifecycle state.
///
/// [`Link::state`] never returns `Connecting`; see the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LinkState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Closing = 3,
}

impl LinkState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => LinkState::Connecting,
            2 => LinkState::Connected,
            3 => LinkState::Closing,
            _ => LinkState::Disconnected,
        }
    }
}

/// Deadlines applied to an established link.
#[derive(Debug, Clone, Copy)]
pub struct LinkOptions {
    pub send_timeout: Duration,
    pub close_timeout: Duration,
}

impl From<&TimeoutConfig> for LinkOptions {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            send_timeout: config.send(),
            close_timeout: config.close(),
        }
    }
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

/// One outbound persistent connection.
///
/// Shared as `Arc<Link>` between the ingress handler (writer) and the read
/// pump (reader). Only the supervisor closes it.
pub struct Link {
    url: String,
    state: AtomicU8,
    writer: Mutex<FrameSink>,
    reader: Mutex<FrameStream>,
    options: LinkOptions,
}

impl Link {
    /// Open a WebSocket connection to `url`, giving up after `connect_timeout`.
    pub async fn connect(
        url: &str,
        connect_timeout: Duration,
        options: LinkOptions,
    ) -> Result<Self, LinkError> {
        tracing::debug!(url = %url, state = ?LinkState::Connecting, "Opening link");

        let (stream, response) = match timeout(connect_timeout, connect_async(url)).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(LinkError::connect(url, e)),
            Err(_) => return Err(LinkError::connect_timeout(url, connect_timeout)),
        };

        tracing::debug!(url = %url, status = %response.status(), "Handshake complete");

        let (sink, stream) = stream.split();
        Ok(Self::from_parts(url, Box::pin(sink), Box::pin(stream), options))
    }

    /// Build a connected link over an existing transport.
    pub fn from_parts(url: &str, sink: FrameSink, stream: FrameStream, options: LinkOptions) -> Self {
        Self {
            url: url.to_string(),
            state: AtomicU8::new(LinkState::Connected as u8),
            writer: Mutex::new(sink),
            reader: Mutex::new(stream),
            options,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> LinkState {
        LinkState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    fn mark_disconnected(&self) {
        self.state
            .store(LinkState::Disconnected as u8, Ordering::Release);
    }

    /// Write one message.
    ///
    /// Concurrent callers are queued on the write lock, so messages reach the
    /// transport in the order their sends acquired it. The whole call,
    /// including the wait for the lock, is bounded by the send timeout.
    pub async fn send(&self, message: Message) -> Result<(), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::send("link is not connected"));
        }

        let send_timeout = self.options.send_timeout;
        let attempt = async {
            let mut writer = self.writer.lock().await;
            // Closed while we waited for the lock.
            if !self.is_connected() {
                return Err(LinkError::send("link is not connected"));
            }
            writer
                .send(message.into_frame())
                .await
                .map_err(|e| LinkError::send(e))
        };

        match timeout(send_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(LinkError::send(format!(
                "timed out after {}ms",
                send_timeout.as_millis()
            ))),
        }
    }

    /// Wait for the next data message or the end of the connection.
    ///
    /// Ping, pong and raw frames are skipped. Any closure or error leaves the
    /// link `Disconnected`, which makes later sends fail fast.
    pub async fn receive(&self) -> Result<Received, LinkError> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    return Ok(Received::Message(Message::Text(text.as_str().to_owned())));
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    return Ok(Received::Message(Message::Binary(data.to_vec())));
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    self.mark_disconnected();
                    return Ok(Received::Closed(Closure::from_frame(frame.as_ref())));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.mark_disconnected();
                    return Err(LinkError::ReceiveFailed(e));
                }
                None => {
                    self.mark_disconnected();
                    return Ok(Received::Closed(Closure::stream_ended()));
                }
            }
        }
    }

    /// Send a normal-closure close frame carrying `reason`.
    ///
    /// Only the first call on a connected link does anything; later calls and
    /// calls after the peer went away return immediately.
    pub async fn close(&self, reason: &str) {
        if self
            .state
            .compare_exchange(
                LinkState::Connected as u8,
                LinkState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: reason.to_owned().into(),
        };
        let handshake = async {
            let mut writer = self.writer.lock().await;
            writer.send(WsMessage::Close(Some(frame))).await
        };

        match timeout(self.options.close_timeout, handshake).await {
            Ok(Ok(())) => tracing::debug!(url = %self.url, "Close frame sent"),
            Ok(Err(e)) => tracing::debug!(url = %self.url, error = %e, "Close handshake failed"),
            Err(_) => tracing::warn!(
                url = %self.url,
                timeout_ms = self.options.close_timeout.as_millis() as u64,
                "Close handshake timed out"
            ),
        }

        self.mark_disconnected();
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("url", &self.url)
            .field("state", &self.state())
            .finish()
    }
}
