//! HTTP to WebSocket bridge library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod link;
pub mod observability;
pub mod resilience;

pub use config::schema::BridgeConfig;
pub use http::IngressServer;
pub use lifecycle::{ConnectionSupervisor, Shutdown};
pub use link::Link;
