//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the service handlers
//! - Wire up middleware (lifecycle probe, optional audit, timeout, user identity)
//! - Bind server to listener with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use uuid::Uuid;

use crate::collector::{Collector, MemorySnapshot, MemoryStats, ProcessMemory, StatsSnapshot};
use crate::config::AppConfig;
use crate::http::audit::{request_audit, AuditRecord, AuditState};
use crate::http::probe::{request_probe, ProbeState};
use crate::lifecycle::Shutdown;
use crate::logging::{CurrentUser, Logger};

/// Header carrying the authenticated user's id, set by the auth layer in
/// front of this service.
pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");

/// Longest simulated work accepted by `/work/{ms}`.
const MAX_WORK_MS: u64 = 10_000;

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub logger: Logger,
    pub collector: Collector,
}

/// Body of `GET /stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub requests: StatsSnapshot,
    pub memory: MemorySnapshot,
}

/// HTTP server for the instrumented service.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(config: AppConfig, logger: Logger, collector: Collector) -> Self {
        let router = Self::build_router(&config, &logger, collector);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers. When
    /// `audit.enabled`, audit records are logged as JSON by the `audit`
    /// component at INFO.
    pub fn build_router(config: &AppConfig, logger: &Logger, collector: Collector) -> Router {
        let audit = config.audit.enabled.then(|| Self::logged_audit(config, logger));
        Self::build_router_with_audit(config, logger, collector, audit)
    }

    /// Build the router, sending audit records to a caller-supplied callback.
    ///
    /// Layers run outermost-last: the probe sees every request first and
    /// observes the final status, including timeouts. The audit layer sits
    /// just inside it, so it captures timeout responses too.
    #[allow(deprecated)]
    pub fn build_router_with_audit(
        config: &AppConfig,
        logger: &Logger,
        collector: Collector,
        audit: Option<AuditState>,
    ) -> Router {
        let probe = ProbeState::new(logger.named("probe"), Some(collector.clone()));
        let state = AppState {
            logger: logger.named("handler"),
            collector,
        };

        let router = Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/stats", get(stats_handler))
            .route("/work/{ms}", get(work_handler))
            .route("/echo", post(echo_handler))
            .with_state(state)
            .layer(middleware::from_fn(user_identity))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        let router = match audit {
            Some(audit) => router.layer(middleware::from_fn_with_state(audit, request_audit)),
            None => router,
        };

        router.layer(middleware::from_fn_with_state(probe, request_probe))
    }

    fn logged_audit(config: &AppConfig, logger: &Logger) -> AuditState {
        let logger = logger.named("audit");
        AuditState::new(Arc::new(move |record: AuditRecord| {
            let json = record.to_json();
            if !json.is_empty() {
                crate::log_info!(logger, "{}", json);
            }
        }))
        .with_service_id(config.audit.service_id)
        .with_max_body_bytes(config.audit.max_body_bytes)
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            audit_enabled = self.config.audit.enabled,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Attach the caller's identity, when the header carries a valid UUID.
async fn user_identity(mut request: Request, next: Next) -> Response {
    let user = request
        .headers()
        .get(&X_USER_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok());
    if let Some(user) = user {
        request.extensions_mut().insert(CurrentUser(user));
    }
    next.run(request).await
}

async fn root_handler(State(state): State<AppState>, request: Request) -> impl IntoResponse {
    crate::log_debug!(
        state.logger,
        ctx: request.extensions(),
        "Serving {} {}",
        request.method(),
        request.uri().path()
    );
    "ok"
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        requests: state.collector.snapshot(),
        memory: ProcessMemory::new().snapshot(),
    })
}

async fn echo_handler(body: Bytes) -> Bytes {
    body
}

/// Simulated slow handler, for exercising concurrency.
async fn work_handler(
    State(state): State<AppState>,
    Path(ms): Path<u64>,
    request: Request,
) -> impl IntoResponse {
    let ms = ms.min(MAX_WORK_MS);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    crate::log_trace!(state.logger, ctx: request.extensions(), "Worked for {} ms", ms);
    format!("worked {} ms", ms)
}
