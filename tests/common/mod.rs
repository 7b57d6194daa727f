//! Shared utilities for integration tests.

use std::sync::Arc;

use axum::Router;
use reqlog::collector::{Collector, MemorySnapshot};
use reqlog::config::AppConfig;
use reqlog::http::HttpServer;
use reqlog::logging::{LogSettings, Logger, MemorySink, OutputFormat, Severity};
use tokio::task::JoinHandle;

/// A fully wired service whose log output lands in memory.
pub struct Harness {
    pub sink: MemorySink,
    pub settings: Arc<LogSettings>,
    pub logger: Logger,
    pub collector: Collector,
    pub router: Router,
    pub aggregator: Option<JoinHandle<()>>,
}

impl Harness {
    /// Build the service; the aggregator is only started when `start_collector`.
    pub fn new(threshold: Severity, format: OutputFormat, start_collector: bool) -> Self {
        let sink = MemorySink::new();
        let settings = Arc::new(LogSettings::new(threshold, format).with_environment("test"));
        settings.set_color(false);
        let logger = Logger::new(Arc::clone(&settings), Arc::new(sink.clone()));

        let (collector, aggregator) = Collector::new(1024);
        let aggregator = start_collector
            .then(|| aggregator.spawn(logger.named("collector"), MemorySnapshot::default));

        let router = HttpServer::build_router(&AppConfig::default(), &logger, collector.clone());
        Self {
            sink,
            settings,
            logger,
            collector,
            router,
            aggregator,
        }
    }

    /// Parsed JSON lines written so far.
    #[allow(dead_code)]
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.sink
            .lines()
            .iter()
            .map(|line| serde_json::from_str(line).expect("every line is JSON"))
            .collect()
    }

    /// Drop every producer handle, wait for the aggregator to drain and
    /// return all records written.
    #[allow(dead_code)]
    pub async fn finish(self) -> Vec<serde_json::Value> {
        let Harness {
            sink,
            router,
            collector,
            aggregator,
            ..
        } = self;
        drop(router);
        drop(collector);
        if let Some(task) = aggregator {
            tokio::time::timeout(std::time::Duration::from_secs(5), task)
                .await
                .expect("aggregator drains once producers are gone")
                .expect("aggregator task");
        }
        sink.lines()
            .iter()
            .map(|line| serde_json::from_str(line).expect("every line is JSON"))
            .collect()
    }
}
