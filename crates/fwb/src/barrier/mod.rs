//! Barrier Module - Write Barrier Notification
//!
//! The policy layer decides *whether* a store needs a barrier; this module
//! is the *how*. A barrier hit is delivered to a [`WriteBarrierManager`],
//! a strategy type chosen statically per allocator:
//!
//! - [`NoBarrier`] - discards every notification
//! - [`CardTableBarrier`] - dirties the cards covering the written range so
//!   the collector re-scans them
//!
//! All notifications funnel through [`notify`]. With the
//! `concurrent-barrier` feature disabled it compiles to nothing, and
//! [`DefaultBarrier`] becomes [`NoBarrier`]. Call sites are the same in
//! both builds.
//!
//! # Ordering
//!
//! Notification always follows the store it reports. [`notify`] issues a
//! release fence first, so a collector that observes a dirty card also
//! observes the stored pointer.

pub mod card_table;
pub mod stats;
pub mod trigger;

pub use card_table::{
    register_card_table, registered_card_tables, unregister_card_table, CardTable,
    CardTableBarrier,
};
pub use stats::{
    barrier_stats, reset_barrier_stats, set_stats_enabled, stats_enabled, AtomicBarrierStats,
    BarrierStats,
};
pub use trigger::ConstructorBarrier;

/// Whether notifications are compiled in
pub const ENABLED: bool = cfg!(feature = "concurrent-barrier");

/// Receiver of write barrier notifications
///
/// Implementations are zero-sized strategy types; the manager is part of
/// the wrapper's type, so dispatch is static.
///
/// # Examples
///
/// ```rust
/// use fwb::barrier::WriteBarrierManager;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// static HITS: AtomicUsize = AtomicUsize::new(0);
///
/// struct CountingBarrier;
///
/// impl WriteBarrierManager for CountingBarrier {
///     fn write_barrier(_address: *const u8, _bytes: usize) {
///         HITS.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait WriteBarrierManager: 'static {
    /// `bytes` bytes starting at `address` were just written
    fn write_barrier(address: *const u8, bytes: usize);
}

/// Manager that ignores every notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoBarrier;

impl WriteBarrierManager for NoBarrier {
    #[inline(always)]
    fn write_barrier(_address: *const u8, _bytes: usize) {}
}

/// Manager used by the allocator tags unless one is named explicitly
#[cfg(feature = "concurrent-barrier")]
pub type DefaultBarrier = CardTableBarrier;

/// Manager used by the allocator tags unless one is named explicitly
#[cfg(not(feature = "concurrent-barrier"))]
pub type DefaultBarrier = NoBarrier;

/// Notify `M` that `bytes` bytes at `address` were written
///
/// A no-op unless the `concurrent-barrier` feature is enabled.
#[inline(always)]
pub fn notify<M: WriteBarrierManager>(address: *const u8, bytes: usize) {
    #[cfg(feature = "concurrent-barrier")]
    {
        std::sync::atomic::fence(std::sync::atomic::Ordering::Release);
        M::write_barrier(address, bytes);
    }

    #[cfg(not(feature = "concurrent-barrier"))]
    {
        let _ = (address, bytes);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Per-thread recording manager for unit tests

    use super::WriteBarrierManager;
    use std::cell::RefCell;

    thread_local! {
        static CALLS: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
    }

    pub(crate) struct RecordingBarrier;

    impl WriteBarrierManager for RecordingBarrier {
        fn write_barrier(address: *const u8, bytes: usize) {
            CALLS.with(|calls| calls.borrow_mut().push((address as usize, bytes)));
        }
    }

    /// Drain the notifications recorded on this thread
    pub(crate) fn take_calls() -> Vec<(usize, usize)> {
        CALLS.with(|calls| std::mem::take(&mut *calls.borrow_mut()))
    }

    /// Expected notify count for `n` barriered stores in this build
    pub(crate) fn expected(n: usize) -> usize {
        if super::ENABLED {
            n
        } else {
            0
        }
    }
}
