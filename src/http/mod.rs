//! HTTP boundary.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, graceful shutdown)
//!     → probe.rs (correlation id, arrival/completion records,
//!                 collector tracking at TRACE)
//!         → client_ip.rs (requester address from headers / peer)
//!     → audit.rs (optional: buffers bodies, one AuditRecord per request
//!                 to a callback)
//!     → timeout, user identity
//!     → handlers
//! ```

pub mod audit;
pub mod client_ip;
pub mod probe;
pub mod server;

pub use audit::{request_audit, AuditCallback, AuditRecord, AuditState};
pub use probe::{request_probe, ProbeState, X_REQUEST_ID};
pub use server::HttpServer;
