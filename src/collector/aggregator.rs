//! The single consumer of lifecycle events.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::collector::memory::MemoryStats;
use crate::collector::stats::ConcurrencyStats;
use crate::collector::LifecycleEvent;
use crate::logging::Logger;

/// Consumes lifecycle events and reports load and memory for each one.
#[derive(Debug)]
pub struct Aggregator {
    rx: mpsc::Receiver<LifecycleEvent>,
    stats: Arc<ConcurrencyStats>,
}

impl Aggregator {
    pub(crate) fn new(rx: mpsc::Receiver<LifecycleEvent>, stats: Arc<ConcurrencyStats>) -> Self {
        Self { rx, stats }
    }

    /// Start the consumer task.
    pub fn spawn<M: MemoryStats>(self, logger: Logger, memory: M) -> JoinHandle<()> {
        tokio::spawn(self.run(logger, memory))
    }

    /// Report events until every `Collector` handle, and so every `InFlight`
    /// guard, is gone. Nothing else stops the loop: requests finishing during
    /// a graceful drain still have their Finished event reported.
    pub async fn run<M: MemoryStats>(mut self, logger: Logger, mut memory: M) {
        tracing::info!("Concurrency collector started");

        while let Some(event) = self.rx.recv().await {
            self.report(&logger, &mut memory, &event);
        }

        tracing::info!(
            total_requests = self.stats.total_requests(),
            max_concurrent_requests = self.stats.max_concurrent_requests(),
            dropped_events = self.stats.dropped_events(),
            "Concurrency collector stopped"
        );
    }

    /// Next queued event, for callers driving the queue themselves.
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        self.rx.recv().await
    }

    fn report<M: MemoryStats>(&self, logger: &Logger, memory: &mut M, event: &LifecycleEvent) {
        let mem = memory.snapshot();
        let stats = self.stats.snapshot();
        crate::log_debug!(
            logger,
            "{} - Request to: {} ({}) - Total requests: {}; Current requests: {}; Max concurrent requests: {}; Dropped events: {}; Alloc = {} MiB; TotalAlloc = {} MiB; Sys = {} MiB; Num gc cycles = {}",
            event.request_id,
            event.url,
            event.phase,
            stats.total_requests,
            stats.concurrent_requests,
            stats.max_concurrent_requests,
            stats.dropped_events,
            mem.allocated_mib(),
            mem.total_allocated_mib(),
            mem.system_mib(),
            mem.gc_cycles,
        );
    }
}
