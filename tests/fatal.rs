//! FATAL termination, observed from a child process.

use std::process::Command;
use std::sync::Arc;

use reqlog::logging::{LogSettings, Logger, OutputFormat, Severity, StdoutSink};

const CHILD_MODE: &str = "REQLOG_FATAL_CHILD";

#[test]
fn fatal_writes_record_then_exits_with_status_one() {
    if std::env::var_os(CHILD_MODE).is_some() {
        let settings = Arc::new(LogSettings::new(Severity::Info, OutputFormat::Raw));
        settings.set_color(false);
        let logger = Logger::new(settings, Arc::new(StdoutSink)).named("startup");
        reqlog::log_fatal!(logger, "cannot bind {}", "0.0.0.0:8080");
        unreachable!("FATAL returned");
    }

    let output = Command::new(std::env::current_exe().unwrap())
        .args([
            "fatal_writes_record_then_exits_with_status_one",
            "--exact",
            "--nocapture",
            "--test-threads=1",
        ])
        .env(CHILD_MODE, "1")
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1), "stdout: {}", stdout);
    assert!(
        stdout.contains("FATAL [startup] cannot bind 0.0.0.0:8080\n"),
        "stdout: {}",
        stdout
    );
    assert!(!stdout.contains("FATAL returned"));
}

#[test]
fn fatal_passes_every_threshold() {
    // FATAL is the highest severity, so any threshold lets it through.
    for threshold in Severity::ALL {
        assert!(LogSettings::new(threshold, OutputFormat::Raw).enabled(Severity::Fatal));
    }
}
