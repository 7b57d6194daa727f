//! Request lifecycle probe.
//!
//! Wraps every inbound request: assigns a correlation id, logs arrival and
//! completion, and feeds the concurrency collector while tracing is on.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::collector::{Collector, InFlight};
use crate::http::client_ip::{self, X_REMOTE_IP};
use crate::logging::{Logger, RequestMeta, Severity};

pub const X_REQUEST_ID: &str = "x-request-id";

/// State shared by every probed request.
#[derive(Debug, Clone)]
pub struct ProbeState {
    logger: Logger,
    collector: Option<Collector>,
}

impl ProbeState {
    pub fn new(logger: Logger, collector: Option<Collector>) -> Self {
        Self { logger, collector }
    }
}

/// Middleware entry point, used with `axum::middleware::from_fn_with_state`.
pub async fn request_probe(
    State(probe): State<ProbeState>,
    mut request: Request,
    next: Next,
) -> Response {
    let meta = RequestMeta::new(request.method().as_str(), request.uri().path());
    let request_id = meta.request_id.to_string();

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let ip = client_ip::resolve(request.headers(), peer);

    // Only pay for lifecycle events at TRACE.
    let in_flight = match &probe.collector {
        Some(collector) if probe.logger.settings().tracing_enabled() => {
            Some(collector.track(meta.path.clone(), meta.request_id))
        }
        _ => None,
    };

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let message = format!(
        "{} - New Request Arrived: Requester ip is {}; Request info: [{} {}{}]",
        request_id,
        ip,
        request.method(),
        host,
        request.uri()
    );

    request.extensions_mut().insert(meta.clone());
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request.headers_mut().insert(X_REQUEST_ID, value);
    }
    if let Ok(value) = HeaderValue::from_str(&ip) {
        request.headers_mut().insert(X_REMOTE_IP, value);
    }

    let arrival = probe
        .logger
        .record(Some(request.extensions()), Severity::Info, message)
        .with_ip(ip.as_str());
    probe.logger.write(arrival);

    let mut scope = RequestScope {
        logger: probe.logger,
        meta,
        ip,
        status: None,
        _in_flight: in_flight,
    };

    let mut response = next.run(request).await;
    scope.status = Some(response.status().as_u16());
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

/// Completion bookkeeping that runs however the request ends.
///
/// The completion record is written in `drop`, before `_in_flight` is
/// released, so it always follows the arrival record of the same request.
struct RequestScope {
    logger: Logger,
    meta: RequestMeta,
    ip: String,
    status: Option<u16>,
    _in_flight: Option<InFlight>,
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        let elapsed = self.meta.started_at.elapsed();
        let seconds = (elapsed.as_secs_f64() * 100.0).round() / 100.0;
        let message = format!(
            "{} - Time consumed for query to {} is {:.2} seconds",
            self.meta.request_id, self.meta.path, seconds
        );

        let mut record = self
            .logger
            .record(None, Severity::Info, message)
            .with_request(&self.meta)
            .with_ip(std::mem::take(&mut self.ip))
            .with_duration_ms(elapsed.as_secs_f64() * 1000.0);
        if let Some(status) = self.status {
            record = record.with_status(status);
        }
        self.logger.write(record);
    }
}
