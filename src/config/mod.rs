//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated)
//!     → LogSettings / Collector / HttpServer built from it
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → logging section re-applied to the live LogSettings
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - An unrecognized log level is not an error: it falls back to INFO and
//!   is reported as a startup warning

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, AuditConfig, CollectorConfig, ListenerConfig, LoggingConfig, TimeoutConfig};
