//! Severity levels and the shared logging settings handle.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::config::LoggingConfig;
use crate::logging::encode::OutputFormat;

/// Ordered log importance.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Severity {
    /// All severities, lowest rank first.
    pub const ALL: [Severity; 6] = [
        Severity::Trace,
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Parse a level name, case-insensitively. Unknown names map to `Info`.
    pub fn parse(name: &str) -> Self {
        Self::parse_strict(name).unwrap_or(Severity::Info)
    }

    /// Parse a level name, returning `None` when the name is not recognized.
    pub fn parse_strict(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Upper-case level name as it appears in records.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl From<u8> for Severity {
    fn from(val: u8) -> Self {
        match val {
            0 => Severity::Trace,
            1 => Severity::Debug,
            2 => Severity::Info,
            3 => Severity::Warn,
            4 => Severity::Error,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` so width specifiers like `{:<5}` apply.
        f.pad(self.name())
    }
}

/// Process-wide logging settings, shared by every `Logger` built from it.
///
/// Written at startup (and on config reload), read on every emission.
/// Relaxed atomics are enough: a reader seeing the previous threshold for a
/// short while is acceptable for a verbosity setting.
#[derive(Debug)]
pub struct LogSettings {
    threshold: AtomicU8,
    format: AtomicU8,
    color: AtomicBool,
    environment: String,
    app: String,
}

impl LogSettings {
    pub fn new(threshold: Severity, format: OutputFormat) -> Self {
        Self {
            threshold: AtomicU8::new(threshold as u8),
            format: AtomicU8::new(format as u8),
            color: AtomicBool::new(true),
            environment: String::new(),
            app: String::new(),
        }
    }

    /// Build settings from the `[logging]` config section.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let settings = Self::new(config.threshold(), OutputFormat::parse(&config.format))
            .with_environment(config.environment.clone())
            .with_app(config.app.clone());
        settings.set_color(config.color);
        settings
    }

    /// Re-apply the mutable parts of a (reloaded) config section.
    pub fn apply(&self, config: &LoggingConfig) {
        self.set_threshold(config.threshold());
        self.set_format(OutputFormat::parse(&config.format));
        self.set_color(config.color);
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = app.into();
        self
    }

    pub fn threshold(&self) -> Severity {
        Severity::from(self.threshold.load(Ordering::Relaxed))
    }

    pub fn set_threshold(&self, threshold: Severity) {
        self.threshold.store(threshold as u8, Ordering::Relaxed);
    }

    pub fn format(&self) -> OutputFormat {
        OutputFormat::from(self.format.load(Ordering::Relaxed))
    }

    pub fn set_format(&self, format: OutputFormat) {
        self.format.store(format as u8, Ordering::Relaxed);
    }

    pub fn color(&self) -> bool {
        self.color.load(Ordering::Relaxed)
    }

    pub fn set_color(&self, color: bool) {
        self.color.store(color, Ordering::Relaxed);
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    /// True when a record of `severity` clears the current threshold.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.threshold()
    }

    /// Lifecycle instrumentation only runs at the most verbose level.
    pub fn tracing_enabled(&self) -> bool {
        self.threshold() == Severity::Trace
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self::new(Severity::Error, OutputFormat::Raw)
    }
}
