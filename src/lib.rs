//! Request-correlated logging and concurrency instrumentation for HTTP
//! services.

pub mod collector;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod logging;

pub use collector::{Collector, ConcurrencyStats};
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use logging::{LogSettings, Logger, Severity};
