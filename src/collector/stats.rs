//! Process-lifetime request counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Request load counters shared by every request flow.
///
/// `concurrent_requests` goes up once when a request starts and down once
/// when it ends. `total_requests` and `max_concurrent_requests` never
/// decrease, and the high-water mark is always at least the current value.
#[derive(Debug, Default)]
pub struct ConcurrencyStats {
    total_requests: AtomicU64,
    concurrent_requests: AtomicU64,
    max_concurrent_requests: AtomicU64,
    dropped_events: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub concurrent_requests: u64,
    pub max_concurrent_requests: u64,
    pub dropped_events: u64,
}

impl ConcurrencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request start and return the new concurrency level.
    pub fn request_started(&self) -> u64 {
        let current = self.concurrent_requests.fetch_add(1, Ordering::SeqCst) + 1;
        // fetch_max on the value this increment produced: a racing larger
        // value is never overwritten by a smaller one.
        self.max_concurrent_requests.fetch_max(current, Ordering::SeqCst);
        self.total_requests.fetch_add(1, Ordering::SeqCst);
        current
    }

    /// Record a request end. Must be paired with exactly one `request_started`.
    pub fn request_finished(&self) {
        let prev = self.concurrent_requests.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(prev > 0, "request_finished without matching request_started");
    }

    pub fn event_dropped(&self) {
        self.dropped_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::SeqCst)
    }

    pub fn concurrent_requests(&self) -> u64 {
        self.concurrent_requests.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_requests(&self) -> u64 {
        self.max_concurrent_requests.load(Ordering::SeqCst)
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.total_requests(),
            concurrent_requests: self.concurrent_requests(),
            max_concurrent_requests: self.max_concurrent_requests(),
            dropped_events: self.dropped_events(),
        }
    }
}
