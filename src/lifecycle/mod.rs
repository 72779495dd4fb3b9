//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Supervisor (supervisor.rs), one iteration per connection cycle:
//!     Idle → Connecting → Running → Draining → (Idle | Terminated)
//!                            │
//!                            ├── pump.rs (Link::receive → Observer)
//!                            └── http::IngressServer (POST / → Link::send)
//!
//! Shutdown (shutdown.rs):
//!     Signal received → stop listener → close link → join pump → exit
//! ```
//!
//! # Design Decisions
//! - Exactly one link, one pump and one listener alive at a time
//! - A cycle's listener is fully stopped before the next cycle binds
//! - An in-flight connect is never cut short; the retry delay is interrupted by shutdown

pub mod pump;
pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use pump::{PumpExit, ReadPump};
pub use shutdown::{Shutdown, ShutdownListener};
pub use supervisor::{ConnectionSupervisor, SupervisorState, SupervisorStats};
