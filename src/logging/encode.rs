//! Record encoding: coloured text lines or JSON lines.

use std::io::Write;

use crate::logging::level::Severity;
use crate::logging::record::LogRecord;

/// Output encoding selector.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `LEVEL [caller] message`, ANSI-coloured by severity.
    #[default]
    Raw = 0,
    /// One JSON object per line.
    Json = 1,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" => OutputFormat::Json,
            _ => OutputFormat::Raw,
        }
    }
}

impl From<u8> for OutputFormat {
    fn from(val: u8) -> Self {
        match val {
            1 => OutputFormat::Json,
            _ => OutputFormat::Raw,
        }
    }
}

const RESET: &str = "\x1b[0m";

/// ANSI foreground colour code for a severity.
pub fn color_code(severity: Severity) -> u8 {
    match severity {
        Severity::Trace => 36,
        Severity::Debug => 35,
        Severity::Info => 32,
        Severity::Warn => 33,
        Severity::Error | Severity::Fatal => 31,
    }
}

/// Encode a record as one newline-terminated line.
///
/// An empty buffer means the record could not be encoded and should not be
/// written.
pub fn encode(record: &LogRecord, format: OutputFormat, color: bool) -> Vec<u8> {
    match format {
        OutputFormat::Raw => encode_raw(record, color),
        OutputFormat::Json => encode_json(record),
    }
}

fn encode_raw(record: &LogRecord, color: bool) -> Vec<u8> {
    let mut line = Vec::with_capacity(record.message.len() + record.caller.len() + 24);
    let caller = &record.caller;
    let level = record.level;
    let message = &record.message;
    // Writing into a Vec cannot fail.
    let _ = if color {
        writeln!(
            line,
            "\x1b[{}m{:<5} [{}] {}{}",
            color_code(level),
            level,
            caller,
            message,
            RESET
        )
    } else {
        writeln!(line, "{:<5} [{}] {}", level, caller, message)
    };
    line
}

fn encode_json(record: &LogRecord) -> Vec<u8> {
    match serde_json::to_vec(record) {
        Ok(mut line) => {
            line.push(b'\n');
            line
        }
        Err(_) => Vec::new(),
    }
}
