//! The emission pipeline.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use axum::http::Extensions;

use crate::logging::context;
use crate::logging::encode::encode;
use crate::logging::level::{LogSettings, Severity};
use crate::logging::record::LogRecord;
use crate::logging::sink::Sink;

/// Logging handle bound to a named component.
///
/// Cloning is cheap; all clones share the same settings and sink. The bound
/// component name is written as the record's `caller`.
#[derive(Clone)]
pub struct Logger {
    settings: Arc<LogSettings>,
    sink: Arc<dyn Sink>,
    component: Arc<str>,
}

impl Logger {
    pub fn new(settings: Arc<LogSettings>, sink: Arc<dyn Sink>) -> Self {
        Self {
            settings,
            sink,
            component: Arc::from(""),
        }
    }

    /// A handle for `component`, sharing this logger's settings and sink.
    pub fn named(&self, component: &str) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            sink: Arc::clone(&self.sink),
            component: Arc::from(component),
        }
    }

    pub fn settings(&self) -> &Arc<LogSettings> {
        &self.settings
    }

    /// Format and emit a record.
    ///
    /// The message is formatted before the threshold is consulted, so
    /// arguments are always evaluated.
    pub fn emit(&self, ctx: Option<&Extensions>, severity: Severity, args: fmt::Arguments<'_>) {
        let message = fmt::format(args);
        self.write(self.record(ctx, severity, message));
    }

    /// Emit the space-separated `Display` form of `values`.
    pub fn emit_values(&self, ctx: Option<&Extensions>, severity: Severity, values: &[&dyn fmt::Display]) {
        let mut message = String::new();
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                message.push(' ');
            }
            let _ = write!(message, "{}", value);
        }
        self.write(self.record(ctx, severity, message));
    }

    /// Build a record enriched from `ctx` without emitting it.
    pub fn record(&self, ctx: Option<&Extensions>, severity: Severity, message: String) -> LogRecord {
        let mut record = LogRecord::new(severity, &*self.component, message);
        record.env = self.settings.environment().to_string();
        record.app = self.settings.app().to_string();

        if let Some(ctx) = ctx {
            record.user = context::user_of(ctx);
            if let Some(meta) = context::request_meta(ctx) {
                record = record.with_request(meta);
            }
        }
        record
    }

    /// Filter, encode and write a record. A FATAL record ends the process
    /// once written.
    pub fn write(&self, record: LogRecord) {
        let level = record.level;
        if !self.settings.enabled(level) {
            return;
        }

        let line = encode(&record, self.settings.format(), self.settings.color());
        if !line.is_empty() {
            self.sink.write_line(&line);
        }

        if level == Severity::Fatal {
            std::process::exit(1);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("component", &self.component)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
