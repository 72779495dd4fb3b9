//! The single ingress route.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::http::request::request_id;
use crate::link::{Link, LinkError, Message};
use crate::observability::Observer;

/// State shared by ingress handlers for one connection cycle.
#[derive(Clone)]
pub struct IngressState {
    pub link: Arc<Link>,
    pub observer: Arc<dyn Observer>,
}

impl IngressState {
    pub fn new(link: Arc<Link>, observer: Arc<dyn Observer>) -> Self {
        Self { link, observer }
    }
}

/// `POST /`: forward the body as one text message.
///
/// Always answers 200; forwarding failures are only logged.
pub async fn forward(
    State(state): State<IngressState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let request_id = request_id(&headers);

    let outcome = match Message::text_from_bytes(body.to_vec()) {
        Ok(message) => {
            if let Some(text) = message.as_text() {
                state.observer.forwarded(text);
            }
            state.link.send(message).await
        }
        Err(raw) => Err(LinkError::send(format!(
            "body of {} bytes is not valid UTF-8",
            raw.len()
        ))),
    };

    match outcome {
        Ok(()) => tracing::debug!(request_id = %request_id, bytes = body.len(), "Forwarded"),
        Err(e) => tracing::error!(request_id = %request_id, error = %e, "Websocket write failed"),
    }

    StatusCode::OK
}
