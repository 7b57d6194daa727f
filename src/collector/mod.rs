//! Concurrency instrumentation.
//!
//! # Data Flow
//! ```text
//! request probe (many flows)
//!     → Collector::track()      (counters up, Started event)
//!     → bounded queue           (try_send; full/closed → drop + count)
//!     → Aggregator              (single consumer task)
//!         → memory.rs snapshot
//!         → one DEBUG record per event
//! InFlight guard dropped
//!     → counters down, Finished event
//! ```
//!
//! # Design Decisions
//! - Producers never block: a slow or missing consumer costs events, never
//!   request latency
//! - Counters live in `ConcurrencyStats` and are updated by the producer, so
//!   they stay exact even when events are dropped
//! - Only active while the log threshold is TRACE (checked by the probe)
//! - The aggregator has no shutdown signal of its own; it ends when the
//!   last `Collector` handle (router state or `InFlight` guard) is dropped

pub mod aggregator;
pub mod memory;
pub mod stats;

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

pub use aggregator::Aggregator;
pub use memory::{CountingAllocator, MemorySnapshot, MemoryStats, ProcessMemory};
pub use stats::{ConcurrencyStats, StatsSnapshot};

/// Which end of a request an event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Started,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Started => f.write_str("started"),
            Phase::Finished => f.write_str("finished"),
        }
    }
}

/// Message marking a request's start or end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub url: String,
    pub request_id: Uuid,
    pub phase: Phase,
}

/// Producer side of the collector. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Collector {
    tx: mpsc::Sender<LifecycleEvent>,
    stats: Arc<ConcurrencyStats>,
}

impl Collector {
    /// Create the producer handle and its (not yet running) consumer.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> (Self, Aggregator) {
        let (tx, rx) = mpsc::channel(capacity);
        let stats = Arc::new(ConcurrencyStats::new());
        let aggregator = Aggregator::new(rx, Arc::clone(&stats));
        (Self { tx, stats }, aggregator)
    }

    /// Start tracking a request. The returned guard ends it when dropped.
    pub fn track(&self, url: impl Into<String>, request_id: Uuid) -> InFlight {
        let url = url.into();
        self.stats.request_started();
        self.publish(LifecycleEvent {
            url: url.clone(),
            request_id,
            phase: Phase::Started,
        });
        InFlight {
            collector: self.clone(),
            url,
            request_id,
        }
    }

    pub fn stats(&self) -> &Arc<ConcurrencyStats> {
        &self.stats
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn publish(&self, event: LifecycleEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                self.stats.event_dropped();
            }
        }
    }
}

/// A request currently being tracked.
///
/// Dropping it (normal completion, error, panic or cancellation) decrements
/// the concurrency counter exactly once and publishes the Finished event.
#[derive(Debug)]
pub struct InFlight {
    collector: Collector,
    url: String,
    request_id: Uuid,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.collector.stats.request_finished();
        self.collector.publish(LifecycleEvent {
            url: std::mem::take(&mut self.url),
            request_id: self.request_id,
            phase: Phase::Finished,
        });
    }
}
