//! Output destinations for encoded records.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Destination stream for encoded records.
///
/// Each call receives one complete line. Write errors are swallowed: a
/// broken log stream must never fail the request that tried to log.
pub trait Sink: Send + Sync {
    fn write_line(&self, line: &[u8]);
}

/// Process standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_line(&self, line: &[u8]) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(line);
        let _ = out.flush();
    }
}

/// Process standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl Sink for StderrSink {
    fn write_line(&self, line: &[u8]) {
        let _ = io::stderr().lock().write_all(line);
    }
}

/// In-memory sink; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    pub fn len(&self) -> usize {
        self.buf.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.buf.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Sink for MemorySink {
    fn write_line(&self, line: &[u8]) {
        self.buf
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(line);
    }
}

/// Named sink selection used by configuration.
pub fn by_name(name: &str) -> Arc<dyn Sink> {
    match name.trim().to_ascii_lowercase().as_str() {
        "stderr" => Arc::new(StderrSink),
        _ => Arc::new(StdoutSink),
    }
}
