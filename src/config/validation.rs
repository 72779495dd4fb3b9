//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require a WebSocket target URL
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Reject unknown log levels
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: BridgeConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::BridgeConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No websocket url specified")]
    MissingTargetUrl,

    #[error("invalid target url '{url}': {reason}")]
    InvalidTargetUrl { url: String, reason: String },

    #[error("listener host must not be empty")]
    EmptyHost,

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),
}

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let raw_url = config.target.url.trim();
    if raw_url.is_empty() {
        errors.push(ValidationError::MissingTargetUrl);
    } else {
        match Url::parse(raw_url) {
            Ok(url) if url.scheme() == "ws" || url.scheme() == "wss" => {
                if url.host_str().is_none() {
                    errors.push(ValidationError::InvalidTargetUrl {
                        url: raw_url.to_string(),
                        reason: "missing host".to_string(),
                    });
                }
                if url.scheme() == "wss" && !cfg!(feature = "tls") {
                    errors.push(ValidationError::InvalidTargetUrl {
                        url: raw_url.to_string(),
                        reason: "wss requires a build with the 'tls' feature".to_string(),
                    });
                }
            }
            Ok(url) => errors.push(ValidationError::InvalidTargetUrl {
                url: raw_url.to_string(),
                reason: format!("unsupported scheme '{}', expected ws or wss", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidTargetUrl {
                url: raw_url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    let positive = [
        ("listener.max_body_bytes", config.listener.max_body_bytes as u64),
        ("retry.delay_ms", config.retry.delay_ms),
        ("timeouts.connect_ms", config.timeouts.connect_ms),
        ("timeouts.send_ms", config.timeouts.send_ms),
        ("timeouts.close_ms", config.timeouts.close_ms),
        ("timeouts.request_ms", config.timeouts.request_ms),
        ("timeouts.drain_ms", config.timeouts.drain_ms),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
