//! Request-scoped context read by the logger.
//!
//! The per-request bag is `http::Extensions`. The logger only looks for the
//! two well-known entries below; anything else in the bag is ignored, and a
//! missing entry simply leaves the matching record fields empty.

use std::time::Instant;

use axum::http::Extensions;
use uuid::Uuid;

/// Identity of the authenticated user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

/// Correlation data attached by the request probe.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub request_id: Uuid,
    pub method: String,
    pub path: String,
    pub started_at: Instant,
}

impl RequestMeta {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method: method.into(),
            path: path.into(),
            started_at: Instant::now(),
        }
    }
}

/// User identifier for a record, if the bag carries one.
pub fn user_of(ctx: &Extensions) -> Option<String> {
    ctx.get::<CurrentUser>().map(|user| user.0.to_string())
}

pub fn request_meta(ctx: &Extensions) -> Option<&RequestMeta> {
    ctx.get::<RequestMeta>()
}
