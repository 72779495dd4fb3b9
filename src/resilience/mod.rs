//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Connect attempt:
//!     → RetryPolicy::connect_timeout bounds the handshake
//!     → On failure: RetryPolicy::delay before the next attempt
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every connect has a deadline
//! - Fixed delay: no growth, no jitter, no attempt cap
//! - Retrying stops only when shutdown is requested

pub mod retry;

pub use retry::RetryPolicy;
