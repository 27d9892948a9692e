//! Barrier Statistics
//!
//! Counters for write barrier activity, updated by [`CardTableBarrier`]:
//!
//! - Notify calls and notified bytes
//! - Cards newly dirtied
//! - Writes that no registered card table covered
//!
//! [`CardTableBarrier`]: super::CardTableBarrier

use crossbeam::utils::CachePadded;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Snapshot of barrier counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BarrierStats {
    /// Notifications received
    pub notify_calls: u64,
    /// Total bytes covered by notifications
    pub bytes_notified: u64,
    /// Cards that went from clean to dirty
    pub cards_dirtied: u64,
    /// Notifications (or parts of them) outside every card table
    pub unrecorded_writes: u64,
}

impl BarrierStats {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge stats from another source (for aggregation)
    #[inline]
    pub fn merge(&mut self, other: &BarrierStats) {
        self.notify_calls += other.notify_calls;
        self.bytes_notified += other.bytes_notified;
        self.cards_dirtied += other.cards_dirtied;
        self.unrecorded_writes += other.unrecorded_writes;
    }

    /// Average notified bytes per call
    #[inline]
    pub fn average_bytes(&self) -> f64 {
        if self.notify_calls == 0 {
            0.0
        } else {
            self.bytes_notified as f64 / self.notify_calls as f64
        }
    }

    /// Send this snapshot to the barrier logger
    pub fn log_summary(&self) {
        crate::logging::log_event(crate::logging::BarrierEvent::Stats(self.clone()));
    }
}

/// Thread-safe barrier counters
///
/// Each counter sits on its own cache line; every mutator thread hits them
/// on the barrier path.
pub struct AtomicBarrierStats {
    notify_calls: CachePadded<AtomicU64>,
    bytes_notified: CachePadded<AtomicU64>,
    cards_dirtied: CachePadded<AtomicU64>,
    unrecorded_writes: CachePadded<AtomicU64>,
}

impl AtomicBarrierStats {
    pub const fn new() -> Self {
        Self {
            notify_calls: CachePadded::new(AtomicU64::new(0)),
            bytes_notified: CachePadded::new(AtomicU64::new(0)),
            cards_dirtied: CachePadded::new(AtomicU64::new(0)),
            unrecorded_writes: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Record one notification of `bytes` bytes that dirtied `cards` cards
    #[inline]
    pub fn record_notify(&self, bytes: usize, cards: usize) {
        self.notify_calls.fetch_add(1, Ordering::Relaxed);
        self.bytes_notified.fetch_add(bytes as u64, Ordering::Relaxed);
        if cards > 0 {
            self.cards_dirtied.fetch_add(cards as u64, Ordering::Relaxed);
        }
    }

    /// Record a notification that no card table covered
    #[inline]
    pub fn record_unrecorded(&self) {
        self.unrecorded_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current stats snapshot
    pub fn snapshot(&self) -> BarrierStats {
        BarrierStats {
            notify_calls: self.notify_calls.load(Ordering::Relaxed),
            bytes_notified: self.bytes_notified.load(Ordering::Relaxed),
            cards_dirtied: self.cards_dirtied.load(Ordering::Relaxed),
            unrecorded_writes: self.unrecorded_writes.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.notify_calls.store(0, Ordering::Relaxed);
        self.bytes_notified.store(0, Ordering::Relaxed);
        self.cards_dirtied.store(0, Ordering::Relaxed);
        self.unrecorded_writes.store(0, Ordering::Relaxed);
    }
}

impl Default for AtomicBarrierStats {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_STATS: AtomicBarrierStats = AtomicBarrierStats::new();
static STATS_ENABLED: AtomicBool = AtomicBool::new(true);

#[inline]
pub(crate) fn global() -> Option<&'static AtomicBarrierStats> {
    if STATS_ENABLED.load(Ordering::Relaxed) {
        Some(&GLOBAL_STATS)
    } else {
        None
    }
}

/// Snapshot of the process-wide counters
pub fn barrier_stats() -> BarrierStats {
    GLOBAL_STATS.snapshot()
}

/// Reset the process-wide counters
pub fn reset_barrier_stats() {
    GLOBAL_STATS.reset();
}

/// Turn process-wide counting on or off
pub fn set_stats_enabled(enabled: bool) {
    STATS_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn stats_enabled() -> bool {
    STATS_ENABLED.load(Ordering::Relaxed)
}
