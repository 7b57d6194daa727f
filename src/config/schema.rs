//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::logging::Severity;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Log pipeline settings.
    pub logging: LoggingConfig,

    /// Concurrency collector settings.
    pub collector: CollectorConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request/response audit capture.
    pub audit: AuditConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Threshold name (trace, debug, info, warn, error, fatal).
    /// Absent means ERROR; an unrecognized name means INFO.
    pub level: Option<String>,

    /// Output encoding: "raw" or "json".
    pub format: String,

    /// Colour RAW lines by severity.
    pub color: bool,

    /// Output stream: "stdout" or "stderr".
    pub sink: String,

    /// Environment tag written into every record (e.g., "production").
    pub environment: String,

    /// Application name written into every record.
    pub app: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: "raw".to_string(),
            color: true,
            sink: "stdout".to_string(),
            environment: String::new(),
            app: String::new(),
        }
    }
}

impl LoggingConfig {
    /// Resolve the configured threshold.
    pub fn threshold(&self) -> Severity {
        match self.level.as_deref() {
            None => Severity::Error,
            Some(name) => Severity::parse(name),
        }
    }

    /// The configured level name when it is set but not recognized.
    pub fn unrecognized_level(&self) -> Option<&str> {
        self.level
            .as_deref()
            .filter(|name| Severity::parse_strict(name).is_none())
    }
}

/// Concurrency collector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Start the aggregator task. Events are only produced at TRACE.
    pub enabled: bool,

    /// Lifecycle events buffered before producers start dropping them.
    pub queue_capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Audit capture configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Install the audit layer and log one JSON audit record per request.
    pub enabled: bool,

    /// Identifier stamped on every audit record.
    pub service_id: u64,

    /// Largest request or response body captured.
    pub max_body_bytes: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_id: 0,
            max_body_bytes: 1024 * 1024,
        }
    }
}
