//! reqlog demo server.
//!
//! An HTTP service wired with the request lifecycle probe, the structured
//! log pipeline and the concurrency collector.
//!
//! ```text
//!  Client ──▶ probe ──▶ [audit] ──▶ timeout ──▶ user identity ──▶ handlers
//!               │
//!               ├──▶ Logger ──▶ stdout / stderr (RAW or JSON lines)
//!               │
//!               └──▶ Collector ──(bounded queue)──▶ Aggregator ──▶ DEBUG records
//!                      (TRACE only)                  + memory snapshot
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reqlog::collector::{Collector, CountingAllocator, ProcessMemory};
use reqlog::config::{loader, validation, watcher::ConfigWatcher, AppConfig};
use reqlog::http::HttpServer;
use reqlog::lifecycle::{signals, Shutdown};
use reqlog::logging::{sink, LogSettings, Logger};

const COLLECTOR_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

#[derive(Parser)]
#[command(name = "reqlog")]
#[command(about = "HTTP service with request-correlated logging and load instrumentation", long_about = None)]
struct Cli {
    /// TOML configuration file. Watched for logging changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override logging.level (trace, debug, info, warn, error, fatal).
    #[arg(long)]
    log_level: Option<String>,

    /// Override logging.format (raw, json).
    #[arg(long)]
    log_format: Option<String>,

    /// Override logging.environment.
    #[arg(long = "env")]
    environment: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = Some(level.clone());
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Some(environment) = &self.environment {
            config.logging.environment = environment.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Diagnostics for the service itself; request records go through Logger.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reqlog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("reqlog v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => loader::load_config(path)?,
        None => AppConfig::default(),
    };
    cli.apply(&mut config);
    validation::validate_config(&config).map_err(loader::ConfigError::Validation)?;
    loader::warn_on_fallbacks(&config);

    let settings = Arc::new(LogSettings::from_config(&config.logging));
    let logger = Logger::new(Arc::clone(&settings), sink::by_name(&config.logging.sink));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        log_level = %settings.threshold(),
        log_format = ?settings.format(),
        environment = %settings.environment(),
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let (collector, aggregator) = Collector::new(config.collector.queue_capacity);
    let collector_task = if config.collector.enabled {
        Some(aggregator.spawn(logger.named("collector"), ProcessMemory::new()))
    } else {
        tracing::info!("Concurrency collector disabled");
        drop(aggregator);
        None
    };

    // Keep the watcher alive for the life of the server.
    let _watcher = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            tokio::spawn(reqlog::config::watcher::apply_updates(
                Arc::clone(&settings),
                updates,
                shutdown.subscribe(),
            ));
            match watcher.run() {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, logger, collector);
    server.run(listener, shutdown.clone()).await?;

    // The router, and every collector handle it held, is gone once `run`
    // returns; the aggregator drains what is left and stops.
    shutdown.trigger();
    if let Some(task) = collector_task {
        if tokio::time::timeout(COLLECTOR_DRAIN_TIMEOUT, task).await.is_err() {
            tracing::warn!("Concurrency collector did not drain in time");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
