//! Per-request audit capture.
//!
//! Buffers the request and response bodies of every request passing through
//! the layer and hands an [`AuditRecord`] to a caller-supplied callback once
//! the response is ready. Bodies larger than the configured limit are not
//! captured; the request then continues with an empty body and the failure
//! goes to the diagnostics channel.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::http::client_ip;

pub const X_USER_NAME: HeaderName = HeaderName::from_static("x-user-name");
pub const X_CUSTOMER_ID: HeaderName = HeaderName::from_static("x-customer-id");
pub const X_APP_ID: HeaderName = HeaderName::from_static("x-app-id");

/// Everything captured about one request/response exchange.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub service_id: u64,
    pub app_id: Option<Uuid>,
    #[serde(serialize_with = "lossy_text")]
    pub request_body: Bytes,
    #[serde(serialize_with = "lossy_text")]
    pub body: Bytes,
    pub username: String,
    pub customer_id: Option<Uuid>,
    /// Host followed by the request target.
    pub url: String,
    pub ip: String,
    pub method: String,
    pub http_status: u16,
    /// Wall time spent serving the request, in nanoseconds.
    #[serde(serialize_with = "nanos")]
    pub time_used: Duration,
    #[serde(serialize_with = "rfc3339")]
    pub request_time: DateTime<Utc>,
}

impl AuditRecord {
    /// JSON form of the record; empty when it cannot be encoded.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn lossy_text<S: Serializer>(bytes: &Bytes, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(bytes))
}

fn nanos<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
}

fn rfc3339<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// Receives one [`AuditRecord`] per request.
pub type AuditCallback = Arc<dyn Fn(AuditRecord) + Send + Sync>;

/// State for [`request_audit`].
#[derive(Clone)]
pub struct AuditState {
    callback: AuditCallback,
    service_id: u64,
    max_body_bytes: usize,
}

impl AuditState {
    pub fn new(callback: AuditCallback) -> Self {
        Self {
            callback,
            service_id: 0,
            max_body_bytes: 1024 * 1024,
        }
    }

    pub fn with_service_id(mut self, service_id: u64) -> Self {
        self.service_id = service_id;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

impl fmt::Debug for AuditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditState")
            .field("service_id", &self.service_id)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

/// Middleware entry point, used with `axum::middleware::from_fn_with_state`.
pub async fn request_audit(State(audit): State<AuditState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_time = Utc::now();

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let headers = request.headers();
    let ip = client_ip::resolve(headers, peer);
    let host = text(headers, &header::HOST);
    let url = format!("{}{}", host, request.uri());
    let method = request.method().to_string();
    let username = text(headers, &X_USER_NAME).to_string();
    let customer_id = uuid(headers, &X_CUSTOMER_ID);
    let app_id = uuid(headers, &X_APP_ID);

    let (parts, body) = request.into_parts();
    let request_body = match axum::body::to_bytes(body, audit.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, url = %url, "Error reading request body");
            Bytes::new()
        }
    };
    let request = Request::from_parts(parts, Body::from(request_body.clone()));

    let response = next.run(request).await;
    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, audit.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, url = %url, "Error reading response body");
            Bytes::new()
        }
    };

    (audit.callback)(AuditRecord {
        service_id: audit.service_id,
        app_id,
        request_body,
        body: body.clone(),
        username,
        customer_id,
        url,
        ip,
        method,
        http_status: parts.status.as_u16(),
        time_used: started.elapsed(),
        request_time,
    });

    Response::from_parts(parts, Body::from(body))
}

fn text<'a>(headers: &'a HeaderMap, name: &HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn uuid(headers: &HeaderMap, name: &HeaderName) -> Option<Uuid> {
    Uuid::parse_str(text(headers, name).trim()).ok()
}
