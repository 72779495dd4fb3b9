//! Payload observers.

/// Receives message payloads flowing through the bridge.
///
/// Implementations must be cheap; they are called inline on the read pump
/// and on ingress request tasks.
pub trait Observer: Send + Sync {
    /// A text message arrived from the WebSocket peer.
    fn inbound(&self, text: &str);

    /// An ingress body was handed to the link, whether or not the send succeeded.
    fn forwarded(&self, text: &str);
}

/// Writes payloads as log events under dedicated targets, so they can be
/// filtered apart from lifecycle logs (`http_to_ws::inbound`, `http_to_ws::forwarded`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn inbound(&self, text: &str) {
        tracing::info!(target: "http_to_ws::inbound", "{text}");
    }

    fn forwarded(&self, text: &str) {
        tracing::info!(target: "http_to_ws::forwarded", "{text}");
    }
}
