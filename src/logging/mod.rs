//! Structured, severity-filtered logging pipeline.
//!
//! # Data Flow
//! ```text
//! log_info!(logger, ctx: &extensions, "...", args)
//!     → logger.rs   (format message, build record, threshold check)
//!     → context.rs  (user / request metadata from the request extensions)
//!     → record.rs   (immutable LogRecord)
//!     → encode.rs   (RAW coloured line or one JSON object per line)
//!     → sink.rs     (stdout / stderr / memory, one write per record)
//! ```
//!
//! # Design Decisions
//! - Settings are injected through a shared `LogSettings` handle, no globals
//! - Caller identity is the component a `Logger` is bound to
//! - Failures inside the pipeline never reach the caller

pub mod context;
pub mod encode;
pub mod level;
pub mod logger;
pub mod macros;
pub mod record;
pub mod sink;

pub use context::{CurrentUser, RequestMeta};
pub use encode::OutputFormat;
pub use level::{LogSettings, Severity};
pub use logger::Logger;
pub use record::LogRecord;
pub use sink::{MemorySink, Sink, StderrSink, StdoutSink};
