//! Test Utilities for the FWB Integration Suite
//!
//! - [`RecordingBarrier`]: manager that records every notification on the
//!   calling thread, so parallel tests never see each other's calls
//! - Card table helpers that cover memory owned by the test only

#![allow(dead_code)]

use fwb::barrier::{register_card_table, CardTable, WriteBarrierManager};
use std::cell::RefCell;
use std::mem::size_of;
use std::sync::Arc;

thread_local! {
    static CALLS: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
}

/// Records `(address, bytes)` for each notification on this thread
pub struct RecordingBarrier;

impl WriteBarrierManager for RecordingBarrier {
    fn write_barrier(address: *const u8, bytes: usize) {
        CALLS.with(|calls| calls.borrow_mut().push((address as usize, bytes)));
    }
}

/// Drain the notifications recorded on this thread
pub fn take_calls() -> Vec<(usize, usize)> {
    CALLS.with(|calls| std::mem::take(&mut *calls.borrow_mut()))
}

/// Expected notify count for `n` barriered operations in this build
pub fn expected(n: usize) -> usize {
    if fwb::barrier::ENABLED {
        n
    } else {
        0
    }
}

/// Assert exactly one notification covering `count` elements of `T` at
/// `address` (none when barriers are compiled out)
pub fn assert_single_notify<T>(calls: &[(usize, usize)], address: *const T, count: usize) {
    assert_eq!(calls.len(), expected(1), "notifications: {:?}", calls);
    if let Some(&(at, bytes)) = calls.first() {
        assert_eq!(at, address as usize);
        assert_eq!(bytes, count * size_of::<T>());
    }
}

// ============================================================================
// CARD TABLES
// ============================================================================

/// 16 byte cards: two pointers per card on 64-bit targets
pub const TEST_CARD_SHIFT: u32 = 4;

/// Index of the first element of `slice` that starts a card
pub fn first_card_aligned<T>(slice: &[T]) -> usize {
    let card = 1usize << TEST_CARD_SHIFT;
    (0..slice.len())
        .find(|&i| (slice.as_ptr() as usize + i * size_of::<T>()) % card == 0)
        .expect("slice too short to contain a card boundary")
}

/// Register a card table covering exactly `slice[start..]`
///
/// `slice[start]` must be card aligned, see [`first_card_aligned`].
pub fn cover<T>(slice: &[T], start: usize) -> Arc<CardTable> {
    let base = slice.as_ptr() as usize + start * size_of::<T>();
    let len = (slice.len() - start) * size_of::<T>();
    let table = Arc::new(CardTable::new(base, len, TEST_CARD_SHIFT).expect("card aligned base"));
    register_card_table(table.clone());
    table
}
