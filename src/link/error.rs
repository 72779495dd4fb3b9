//! Link error taxonomy.

use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors produced by [`Link`](crate::link::Link) operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The handshake failed or did not finish in time. Always transient.
    #[error("connect to {url} failed: {reason}")]
    ConnectFailed { url: String, reason: String },

    /// A single outbound message could not be written. The link stays as it is.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The inbound side broke without a close handshake.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[from] tungstenite::Error),
}

impl LinkError {
    pub(crate) fn connect(url: &str, reason: impl ToString) -> Self {
        Self::ConnectFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn connect_timeout(url: &str, after: Duration) -> Self {
        Self::connect(url, format!("timed out after {}ms", after.as_millis()))
    }

    pub(crate) fn send(reason: impl ToString) -> Self {
        Self::SendFailed(reason.to_string())
    }
}
