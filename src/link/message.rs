//! Message and closure types exchanged over the link.

use std::fmt;

use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// A data message. Delivery is at-most-once; messages carry no identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
}

impl Message {
    /// Build a text message from an opaque body.
    ///
    /// Text frames must carry UTF-8, so bodies that are not valid UTF-8 are
    /// handed back unchanged.
    pub fn text_from_bytes(body: Vec<u8>) -> Result<Self, Vec<u8>> {
        String::from_utf8(body)
            .map(Message::Text)
            .map_err(|e| e.into_bytes())
    }

    pub fn len(&self) -> usize {
        match self {
            Message::Text(text) => text.len(),
            Message::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(text) => Some(text),
            Message::Binary(_) => None,
        }
    }

    pub(crate) fn into_frame(self) -> WsMessage {
        match self {
            Message::Text(text) => WsMessage::text(text),
            Message::Binary(data) => WsMessage::binary(data),
        }
    }
}

/// How the peer ended the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Closure {
    /// Close handshake with status 1000.
    Normal,
    /// Any other status, a close frame without status, or a stream that ended
    /// without a close frame.
    Abnormal { code: Option<u16>, reason: String },
}

impl Closure {
    pub(crate) fn from_frame(frame: Option<&CloseFrame>) -> Self {
        match frame {
            Some(frame) if frame.code == CloseCode::Normal => Closure::Normal,
            Some(frame) => Closure::Abnormal {
                code: Some(u16::from(frame.code)),
                reason: frame.reason.as_str().to_string(),
            },
            None => Closure::Abnormal {
                code: None,
                reason: "close frame without status".to_string(),
            },
        }
    }

    pub(crate) fn stream_ended() -> Self {
        Closure::Abnormal {
            code: None,
            reason: "stream ended without close frame".to_string(),
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Closure::Normal)
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Closure::Normal => write!(f, "normal closure"),
            Closure::Abnormal {
                code: Some(code),
                reason,
            } => write!(f, "abnormal closure ({code}): {reason}"),
            Closure::Abnormal { code: None, reason } => write!(f, "abnormal closure: {reason}"),
        }
    }
}

/// Outcome of one [`Link::receive`](crate::link::Link::receive) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Message(Message),
    Closed(Closure),
}
