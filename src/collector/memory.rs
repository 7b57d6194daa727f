//! Memory pressure sampling.
//!
//! `ProcessMemory` combines the counters kept by `CountingAllocator` (when
//! the binary installs it as the global allocator) with the process figures
//! reported by the OS through `sysinfo`.

use std::alloc::{GlobalAlloc, Layout, System as SystemAlloc};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use sysinfo::{Pid, System};

const MIB: u64 = 1024 * 1024;

/// Point-in-time memory figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemorySnapshot {
    /// Bytes currently allocated on the heap.
    pub allocated_bytes: u64,
    /// Bytes allocated over the life of the process.
    pub total_allocated_bytes: u64,
    /// Memory reserved from the OS.
    pub system_bytes: u64,
    /// Completed garbage-collection cycles, for providers backed by a
    /// collecting runtime.
    pub gc_cycles: u32,
}

impl MemorySnapshot {
    pub fn allocated_mib(&self) -> u64 {
        self.allocated_bytes / MIB
    }

    pub fn total_allocated_mib(&self) -> u64 {
        self.total_allocated_bytes / MIB
    }

    pub fn system_mib(&self) -> u64 {
        self.system_bytes / MIB
    }
}

/// Source of memory snapshots.
pub trait MemoryStats: Send + 'static {
    fn snapshot(&mut self) -> MemorySnapshot;
}

impl<F> MemoryStats for F
where
    F: FnMut() -> MemorySnapshot + Send + 'static,
{
    fn snapshot(&mut self) -> MemorySnapshot {
        self()
    }
}

static ALLOCATED: AtomicU64 = AtomicU64::new(0);
static TOTAL_ALLOCATED: AtomicU64 = AtomicU64::new(0);

/// Global allocator wrapper that counts live and cumulative heap bytes.
///
/// ```ignore
/// #[global_allocator]
/// static GLOBAL: reqlog::collector::CountingAllocator = reqlog::collector::CountingAllocator;
/// ```
pub struct CountingAllocator;

impl CountingAllocator {
    pub fn allocated() -> u64 {
        ALLOCATED.load(Ordering::Relaxed)
    }

    pub fn total_allocated() -> u64 {
        TOTAL_ALLOCATED.load(Ordering::Relaxed)
    }

    fn record_alloc(size: usize) {
        ALLOCATED.fetch_add(size as u64, Ordering::Relaxed);
        TOTAL_ALLOCATED.fetch_add(size as u64, Ordering::Relaxed);
    }

    fn record_dealloc(size: usize) {
        ALLOCATED.fetch_sub(size as u64, Ordering::Relaxed);
    }
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = SystemAlloc.alloc(layout);
        if !ptr.is_null() {
            Self::record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = SystemAlloc.alloc_zeroed(layout);
        if !ptr.is_null() {
            Self::record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        SystemAlloc.dealloc(ptr, layout);
        Self::record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = SystemAlloc.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            Self::record_dealloc(layout.size());
            Self::record_alloc(new_size);
        }
        new_ptr
    }
}

/// Memory figures for the current process.
pub struct ProcessMemory {
    system: System,
    pid: Option<Pid>,
}

impl ProcessMemory {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    /// (resident, virtual) bytes as reported by the OS.
    fn process_bytes(&mut self) -> (u64, u64) {
        let Some(pid) = self.pid else {
            return (0, 0);
        };
        if !self.system.refresh_process(pid) {
            return (0, 0);
        }
        self.system
            .process(pid)
            .map(|p| (p.memory(), p.virtual_memory()))
            .unwrap_or((0, 0))
    }
}

impl Default for ProcessMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStats for ProcessMemory {
    fn snapshot(&mut self) -> MemorySnapshot {
        let (resident, reserved) = self.process_bytes();
        let counted = CountingAllocator::total_allocated() > 0;
        MemorySnapshot {
            // Without the counting allocator, resident memory is the
            // closest figure the OS can give.
            allocated_bytes: if counted { CountingAllocator::allocated() } else { resident },
            total_allocated_bytes: CountingAllocator::total_allocated(),
            system_bytes: reserved,
            // The Rust heap is not garbage collected.
            gc_cycles: 0,
        }
    }
}
