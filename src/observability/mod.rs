//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (connect, send failure, disconnect, shutdown)
//!     → Observer callbacks (message payloads in both directions)
//!
//! Consumers:
//!     → logging.rs installs the fmt subscriber (binary only)
//!     → observer.rs LogObserver prints payloads through tracing
//! ```
//!
//! # Design Decisions
//! - The library never installs a global subscriber; main.rs does
//! - Payload sinks are passed to components explicitly as `Arc<dyn Observer>`
//! - No metrics

pub mod logging;
pub mod observer;

pub use observer::{LogObserver, Observer};
