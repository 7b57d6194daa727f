//! The structured log record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::logging::context::RequestMeta;
use crate::logging::level::Severity;

/// One structured, timestamped log entry.
///
/// Built fresh for every emission and never mutated once handed to the
/// encoder. Empty optional fields are left out of the JSON encoding.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// UTC time of construction, RFC 3339 with nanoseconds.
    #[serde(serialize_with = "rfc3339_nanos")]
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "level_name")]
    pub level: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Component that produced the record.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub caller: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub env: String,
    pub message: String,
}

impl LogRecord {
    pub fn new(level: Severity, caller: impl Into<String>, message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            request_id: None,
            caller: caller.into(),
            user: None,
            method: None,
            path: None,
            status: None,
            ip: None,
            duration_ms: None,
            app: String::new(),
            env: String::new(),
            message,
        }
    }

    /// Copy correlation id, method and path from the request metadata.
    pub fn with_request(mut self, meta: &RequestMeta) -> Self {
        self.request_id = Some(meta.request_id.to_string());
        self.method = Some(meta.method.clone());
        self.path = Some(meta.path.clone());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        let ip = ip.into();
        if !ip.is_empty() {
            self.ip = Some(ip);
        }
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

fn rfc3339_nanos<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

fn level_name<S: Serializer>(level: &Severity, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(level.name())
}
