//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http_to_ws::config::BridgeConfig;
use http_to_ws::lifecycle::{ConnectionSupervisor, Shutdown, SupervisorState, SupervisorStats};
use http_to_ws::observability::Observer;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;

pub type PeerConn = WebSocketStream<TcpStream>;

/// Start a WebSocket peer. Every accepted connection is handed to the test.
pub async fn start_ws_peer() -> (SocketAddr, mpsc::UnboundedReceiver<PeerConn>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Ok(ws) = tokio_tungstenite::accept_async(socket).await {
                    let _ = tx.send(ws);
                }
            });
        }
    });

    (addr, rx)
}

/// A TCP connection whose WebSocket handshake the test completes by hand.
pub struct PendingHandshake {
    socket: TcpStream,
}

impl PendingHandshake {
    pub async fn complete(self) -> PeerConn {
        tokio_tungstenite::accept_async(self.socket).await.unwrap()
    }
}

/// Start a WebSocket peer that holds every handshake until the test completes it.
pub async fn start_held_ws_peer() -> (SocketAddr, mpsc::UnboundedReceiver<PendingHandshake>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            if tx.send(PendingHandshake { socket }).is_err() {
                break;
            }
        }
    });

    (addr, rx)
}

/// A TCP peer that accepts connections and never speaks.
pub async fn start_silent_peer() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// A port nothing listens on right now.
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Bridge config bound to localhost with short timings.
pub fn test_config(url: String, port: u16, retry_delay_ms: u64) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.target.url = url;
    config.listener.host = "127.0.0.1".into();
    config.listener.port = port;
    config.retry.delay_ms = retry_delay_ms;
    config.timeouts.connect_ms = 2_000;
    config.timeouts.send_ms = 1_000;
    config.timeouts.close_ms = 500;
    config.timeouts.drain_ms = 2_000;
    config
}

/// Records payloads seen by the bridge.
#[derive(Default)]
pub struct RecordingObserver {
    pub inbound: Mutex<Vec<String>>,
    pub forwarded: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn inbound_texts(&self) -> Vec<String> {
        self.inbound.lock().unwrap().clone()
    }
}

impl Observer for RecordingObserver {
    fn inbound(&self, text: &str) {
        self.inbound.lock().unwrap().push(text.to_string());
    }

    fn forwarded(&self, text: &str) {
        self.forwarded.lock().unwrap().push(text.to_string());
    }
}

/// A supervisor running on its own task.
pub struct Running {
    pub shutdown: Shutdown,
    pub state: watch::Receiver<SupervisorState>,
    pub observer: Arc<RecordingObserver>,
    pub task: JoinHandle<SupervisorStats>,
}

impl Running {
    pub async fn wait_for(&mut self, wanted: SupervisorState) {
        tokio::time::timeout(Duration::from_secs(5), self.state.wait_for(|s| *s == wanted))
            .await
            .unwrap_or_else(|_| panic!("supervisor never reached {wanted:?}"))
            .unwrap();
    }

    pub async fn stop(self) -> SupervisorStats {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("supervisor did not stop in time")
            .unwrap()
    }
}

pub fn spawn_supervisor(config: BridgeConfig) -> Running {
    let shutdown = Shutdown::new();
    let observer = Arc::new(RecordingObserver::default());
    let supervisor = ConnectionSupervisor::new(config, observer.clone(), shutdown.subscribe());
    let state = supervisor.state();
    let task = tokio::spawn(supervisor.run());

    Running {
        shutdown,
        state,
        observer,
        task,
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Wait until `conn` yields a data or close frame.
pub async fn next_frame(conn: &mut PeerConn) -> tokio_tungstenite::tungstenite::Message {
    use futures_util::StreamExt;
    use tokio_tungstenite::tungstenite::Message;

    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), conn.next())
            .await
            .expect("no frame from bridge")
            .expect("peer stream ended")
            .expect("peer read failed");
        match frame {
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            other => return other,
        }
    }
}

/// Wait for the next connection the bridge opens to the peer.
pub async fn next_conn(conns: &mut mpsc::UnboundedReceiver<PeerConn>) -> PeerConn {
    tokio::time::timeout(Duration::from_secs(5), conns.recv())
        .await
        .expect("bridge did not connect")
        .unwrap()
}
