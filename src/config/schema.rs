//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Outbound WebSocket target.
    pub target: TargetConfig,

    /// Ingress listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Reconnect behaviour.
    pub retry: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Outbound connection target.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TargetConfig {
    /// WebSocket URL (e.g., "ws://example.test/socket"). Usually given on the command line.
    pub url: String,
}

/// Ingress listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl ListenerConfig {
    /// The combined `host:port` bind address.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9999,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Reconnect configuration.
///
/// The delay is fixed: no growth, no jitter, no attempt cap.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay between a failed cycle and the next connect attempt, in milliseconds.
    pub delay_ms: u64,

    /// End the cycle (and so retry the bind) when the ingress listener cannot bind.
    pub restart_on_listen_failure: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_ms: 5_000,
            restart_on_listen_failure: false,
        }
    }
}

/// Timeout configuration for link and ingress operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// WebSocket handshake timeout in milliseconds.
    pub connect_ms: u64,

    /// Upper bound for a single outbound send in milliseconds.
    pub send_ms: u64,

    /// Upper bound for the close handshake in milliseconds.
    pub close_ms: u64,

    /// Upper bound for one ingress request in milliseconds.
    pub request_ms: u64,

    /// How long draining waits for the ingress listener to stop, in milliseconds.
    pub drain_ms: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn send(&self) -> Duration {
        Duration::from_millis(self.send_ms)
    }

    pub fn close(&self) -> Duration {
        Duration::from_millis(self.close_ms)
    }

    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn drain(&self) -> Duration {
        Duration::from_millis(self.drain_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 60_000,
            send_ms: 10_000,
            close_ms: 5_000,
            request_ms: 30_000,
            drain_ms: 10_000,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,

    /// Colored console output.
    pub ansi: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ansi: true,
        }
    }
}
