//! http-to-ws
//!
//! Forwards every `POST /` body as a text message over one persistent
//! WebSocket connection, and logs whatever the peer sends back.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  HTTP-TO-WS                  │
//!                       │                                              │
//!     POST / ───────────┼─▶ ┌──────────┐  send   ┌──────────┐          │
//!                       │   │   http   │────────▶│          │──────────┼──▶ WebSocket
//!     200 OK ◀──────────┼── │ ingress  │         │   link   │          │      peer
//!                       │   └──────────┘         │          │◀─────────┼───
//!                       │                        └────┬─────┘          │
//!                       │                    receive  │                │
//!                       │                             ▼                │
//!                       │   ┌──────────┐        ┌──────────┐           │
//!                       │   │ observer │◀───────│   pump   │           │
//!                       │   └──────────┘        └──────────┘           │
//!                       │                                              │
//!                       │  lifecycle: supervisor (connect → run →      │
//!                       │  drain → retry), shutdown, signals           │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use http_to_ws::config::{load_config, validate_config, BridgeConfig, ConfigError};
use http_to_ws::lifecycle::{signals, ConnectionSupervisor, Shutdown};
use http_to_ws::observability::{logging, LogObserver};

#[derive(Debug, Parser)]
#[command(name = "http-to-ws")]
#[command(about = "Convert HTTP requests to WebSocket messages", long_about = None, version)]
struct Cli {
    /// WebSocket URL to connect to (e.g. ws://example.test/socket)
    url: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "HTTP_TO_WS_CONFIG")]
    config: Option<PathBuf>,

    /// Host for the HTTP server [default: 0.0.0.0]
    #[arg(long, env = "HTTP_TO_WS_HOST")]
    host: Option<String>,

    /// Port for the HTTP server [default: 9999]
    #[arg(long, env = "HTTP_TO_WS_PORT")]
    port: Option<u16>,

    /// WebSocket handshake timeout in milliseconds [default: 60000]
    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    /// Delay between reconnect attempts in milliseconds [default: 5000]
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Log level when RUST_LOG is unset [default: info]
    #[arg(long, env = "HTTP_TO_WS_LOG")]
    log_level: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    /// File (or defaults), then explicit flags on top, then validation.
    fn into_config(self) -> Result<BridgeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => BridgeConfig::default(),
        };

        if let Some(url) = self.url {
            config.target.url = url;
        }
        if let Some(host) = self.host {
            config.listener.host = host;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.timeouts.connect_ms = ms;
        }
        if let Some(ms) = self.retry_delay_ms {
            config.retry.delay_ms = ms;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if self.no_color {
            config.observability.ansi = false;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init(&config.observability);
    tracing::info!("http-to-ws v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let supervisor = ConnectionSupervisor::new(config, Arc::new(LogObserver), shutdown.subscribe());
    supervisor.run().await;

    tracing::info!("Shutdown complete");
}
