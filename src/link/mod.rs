//! Outbound link subsystem.
//!
//! # Data Flow
//! ```text
//! ingress handler ──send──▶ ┌──────────┐ ──frames──▶ WebSocket peer
//!                           │   Link   │
//! read pump ◀──receive───── └──────────┘ ◀──frames── WebSocket peer
//! ```
//!
//! # Design Decisions
//! - One Link per connection cycle, owned by the supervisor and shared as `Arc<Link>`
//! - Writes are serialized by an async mutex; reads never contend with writes
//! - Every operation except `receive` has a deadline
//! - Control frames are handled below this layer and never surfaced

pub mod connection;
pub mod error;
pub mod message;

pub use connection::{FrameSink, FrameStream, Link, LinkOptions, LinkState};
pub use error::LinkError;
pub use message::{Closure, Message, Received};
