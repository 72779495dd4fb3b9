//! HTTP ingress subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (bind, axum serve, graceful shutdown)
//!     → request.rs (request ID, tracing, body limit, timeout)
//!     → handler.rs (POST / → Link::send)
//!     → 200 OK, whatever the send outcome
//! ```
//!
//! # Design Decisions
//! - One route only; axum answers 404/405 for everything else
//! - The response never reflects delivery: this is fire-and-forget
//! - A fresh listener per connection cycle, bound to that cycle's link

pub mod handler;
pub mod request;
pub mod server;

pub use handler::IngressState;
pub use server::{IngressError, IngressServer};
