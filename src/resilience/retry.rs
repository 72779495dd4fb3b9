//! Fixed-delay reconnect policy.

use std::time::Duration;

use crate::config::BridgeConfig;

/// Reconnect parameters for the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound for one connect attempt.
    pub connect_timeout: Duration,
    /// Pause between a failed cycle and the next attempt.
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

    pub fn new(connect_timeout: Duration, delay: Duration) -> Self {
        Self {
            connect_timeout,
            delay,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            config.timeouts.connect(),
            Duration::from_millis(config.retry.delay_ms),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CONNECT_TIMEOUT, Self::DEFAULT_DELAY)
    }
}
