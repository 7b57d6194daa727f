//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All problems are
//! reported together rather than stopping at the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address",
            message: format!("'{}' is not a socket address", config.listener.bind_address),
        });
    }

    if config.collector.queue_capacity == 0 {
        errors.push(ValidationError {
            field: "collector.queue_capacity",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.request_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    if !matches!(config.logging.sink.to_ascii_lowercase().as_str(), "stdout" | "stderr") {
        errors.push(ValidationError {
            field: "logging.sink",
            message: format!("unknown sink '{}', expected stdout or stderr", config.logging.sink),
        });
    }

    if config.audit.max_body_bytes == 0 {
        errors.push(ValidationError {
            field: "audit.max_body_bytes",
            message: "must be greater than zero".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
