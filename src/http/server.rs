//! Ingress HTTP server.
//!
//! # Responsibilities
//! - Bind the configured address (fresh per connection cycle)
//! - Create the axum Router with the forwarding route and middleware
//! - Serve until the shutdown future resolves, then drain in-flight requests

use std::future::Future;
use std::net::SocketAddr;

use axum::routing::post;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ListenerConfig, TimeoutConfig};
use crate::http::handler::{forward, IngressState};
use crate::http::request::with_middleware;

/// Error type for ingress operations.
#[derive(Debug, Error)]
pub enum IngressError {
    /// Bind or accept loop failure. Degrades ingress for the current cycle only.
    #[error("listen on {addr} failed: {source}")]
    ListenFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// The HTTP listener for one connection cycle.
pub struct IngressServer {
    listener: TcpListener,
    router: Router,
}

impl IngressServer {
    /// Bind the listener and build the router around `state`.
    pub async fn bind(
        listener_config: &ListenerConfig,
        timeouts: &TimeoutConfig,
        state: IngressState,
    ) -> Result<Self, IngressError> {
        let addr = listener_config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| IngressError::ListenFailed { addr, source })?;

        let router = Self::build_router(listener_config, timeouts, state);
        Ok(Self { listener, router })
    }

    fn build_router(
        listener_config: &ListenerConfig,
        timeouts: &TimeoutConfig,
        state: IngressState,
    ) -> Router {
        let router = Router::new().route("/", post(forward)).with_state(state);
        with_middleware(router, listener_config.max_body_bytes, timeouts.request())
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` resolves. Returns once every in-flight request
    /// has finished and the listener is dropped.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), IngressError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self
            .listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| IngressError::ListenFailed {
                addr: addr.clone(),
                source,
            })?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use futures_util::StreamExt;
    use tokio::sync::{mpsc, oneshot};
    use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

    use crate::link::{Link, LinkOptions};
    use crate::observability::Observer;

    #[derive(Default)]
    struct Forwarded(Mutex<Vec<String>>);

    impl Observer for Forwarded {
        fn inbound(&self, _text: &str) {}

        fn forwarded(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    struct Harness {
        addr: SocketAddr,
        frames: mpsc::UnboundedReceiver<WsMessage>,
        observer: Arc<Forwarded>,
        stop: oneshot::Sender<()>,
        task: tokio::task::JoinHandle<Result<(), IngressError>>,
    }

    fn capture_link() -> (Arc<Link>, mpsc::UnboundedReceiver<WsMessage>) {
        let (tx, frames) = mpsc::unbounded_channel::<WsMessage>();
        let sink = futures_util::sink::unfold(tx, |tx, frame: WsMessage| async move {
            tx.send(frame).map_err(|_| WsError::ConnectionClosed)?;
            Ok::<_, WsError>(tx)
        });
        let stream = futures_util::stream::pending::<Result<WsMessage, WsError>>().boxed();
        let link = Link::from_parts("ws://fake.test/", Box::pin(sink), stream, LinkOptions::default());
        (Arc::new(link), frames)
    }

    async fn start(max_body_bytes: usize) -> Harness {
        let (link, frames) = capture_link();
        let observer = Arc::new(Forwarded::default());
        let config = ListenerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            max_body_bytes,
        };
        let state = IngressState::new(link, observer.clone());
        let server = IngressServer::bind(&config, &TimeoutConfig::default(), state)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(server.serve(async {
            let _ = stopped.await;
        }));

        Harness {
            addr,
            frames,
            observer,
            stop,
            task,
        }
    }

    #[tokio::test]
    async fn test_post_body_becomes_one_text_message() {
        let mut harness = start(1024).await;

        let res = reqwest::Client::new()
            .post(format!("http://{}/", harness.addr))
            .body("hello")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 200);
        assert!(res.headers().contains_key("x-request-id"));
        match harness.frames.recv().await.unwrap() {
            WsMessage::Text(text) => assert_eq!(text.as_str(), "hello"),
            other => panic!("unexpected frame {other:?}"),
        }
        assert!(harness.frames.try_recv().is_err());
        assert_eq!(*harness.observer.0.lock().unwrap(), vec!["hello".to_string()]);

        harness.stop.send(()).unwrap();
        harness.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_acknowledged_but_not_sent() {
        let mut harness = start(1024).await;

        let res = reqwest::Client::new()
            .post(format!("http://{}/", harness.addr))
            .body(vec![0xffu8, 0xfe])
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 200);
        assert!(harness.frames.try_recv().is_err());
        assert!(harness.observer.0.lock().unwrap().is_empty());

        harness.stop.send(()).unwrap();
        harness.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_only_post_root_is_routed() {
        let harness = start(1024).await;
        let client = reqwest::Client::new();

        let res = client
            .get(format!("http://{}/", harness.addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 405);

        let res = client
            .post(format!("http://{}/other", harness.addr))
            .body("x")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 404);

        harness.stop.send(()).unwrap();
        harness.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_client_request_id_is_propagated() {
        let mut harness = start(1024).await;

        let res = reqwest::Client::new()
            .post(format!("http://{}/", harness.addr))
            .header("x-request-id", "req-42")
            .body("tagged")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()["x-request-id"], "req-42");
        assert!(harness.frames.recv().await.is_some());

        harness.stop.send(()).unwrap();
        harness.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut harness = start(8).await;

        let res = reqwest::Client::new()
            .post(format!("http://{}/", harness.addr))
            .body("0123456789abcdef")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 413);
        assert!(harness.frames.try_recv().is_err());

        harness.stop.send(()).unwrap();
        harness.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bind_conflict_is_listen_failed() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let config = ListenerConfig {
            host: "127.0.0.1".into(),
            port,
            ..ListenerConfig::default()
        };
        let (link, _frames) = capture_link();
        let state = IngressState::new(link, Arc::new(Forwarded::default()));

        let err = IngressServer::bind(&config, &TimeoutConfig::default(), state)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IngressError::ListenFailed { .. }));
    }
}
