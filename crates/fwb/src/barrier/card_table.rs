//! Card Table - Recording Barrier Hits
//!
//! The heap range covered by a card table is split into cards of
//! `1 << card_shift` bytes, one byte of state per card. A barrier hit marks
//! every card overlapping the written range dirty; the collector later
//! drains the dirty cards and re-scans just those parts of the heap.
//!
//! ```text
//!   heap   |  card 0  |  card 1  |  card 2  |  card 3  |
//!   write              [=====)
//!   cards     clean      DIRTY      clean      clean
//! ```
//!
//! Tables are registered in a process-wide registry that
//! [`CardTableBarrier`] consults on every notification. Writes outside every
//! registered table are only counted.

use super::{stats, WriteBarrierManager};
use crate::config::{active_config, BarrierConfig, ConfigError, MAX_CARD_SHIFT, MIN_CARD_SHIFT};
use crate::error::{FwbError, Result};
use crate::logging::{log_event, BarrierEvent};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

const CLEAN: u8 = 0;
const DIRTY: u8 = 1;

/// Dirty card table for one contiguous heap range
///
/// # Examples
///
/// ```rust
/// use fwb::barrier::CardTable;
///
/// let table = CardTable::new(0x10000, 4096, 9).unwrap();
/// assert_eq!(table.card_count(), 8);
///
/// table.dirty_range(0x10000 + 500, 24).unwrap();
/// assert_eq!(table.dirty_card_count(), 2);
///
/// let mut rescanned = Vec::new();
/// table.drain_dirty(|start, len| rescanned.push((start, len)));
/// assert_eq!(rescanned, vec![(0x10000, 512), (0x10200, 512)]);
/// assert_eq!(table.dirty_card_count(), 0);
/// ```
pub struct CardTable {
    base: usize,
    len: usize,
    card_shift: u32,
    cards: Box<[AtomicU8]>,
}

impl CardTable {
    /// Create a table covering `[base, base + len)` with
    /// `1 << card_shift` byte cards
    ///
    /// `base` must be card aligned. The last card may extend past the end
    /// of the range.
    pub fn new(base: usize, len: usize, card_shift: u32) -> Result<Self> {
        if !(MIN_CARD_SHIFT..=MAX_CARD_SHIFT).contains(&card_shift) {
            return Err(ConfigError::InvalidCardShift(format!(
                "card_shift must be within {}..={} (got {})",
                MIN_CARD_SHIFT, MAX_CARD_SHIFT, card_shift
            ))
            .into());
        }

        if len == 0 {
            return Err(FwbError::InvalidArgument(
                "card table must cover at least one byte".to_string(),
            ));
        }

        if base.checked_add(len).is_none() {
            return Err(FwbError::InvalidArgument(format!(
                "range {:#x}+{} overflows the address space",
                base, len
            )));
        }

        let card_size = 1usize << card_shift;
        if base & (card_size - 1) != 0 {
            return Err(FwbError::AlignmentError {
                address: base,
                alignment: card_size,
            });
        }

        let card_count = len.div_ceil(card_size);
        let cards = (0..card_count).map(|_| AtomicU8::new(CLEAN)).collect();

        Ok(Self {
            base,
            len,
            card_shift,
            cards,
        })
    }

    /// Create a table using the card size from `config`
    pub fn with_config(base: usize, len: usize, config: &BarrierConfig) -> Result<Self> {
        config.validate()?;
        Self::new(base, len, config.card_shift)
    }

    /// Create a table using the card size of the configuration applied by
    /// [`crate::init`]
    pub fn with_active_config(base: usize, len: usize) -> Result<Self> {
        Self::new(base, len, active_config().card_shift)
    }

    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a table covers at least one byte
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last covered byte
    #[inline]
    pub fn end(&self) -> usize {
        self.base + self.len
    }

    #[inline]
    pub fn card_size(&self) -> usize {
        1 << self.card_shift
    }

    #[inline]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Whether `[address, address + bytes)` lies within the table
    #[inline]
    pub fn covers(&self, address: usize, bytes: usize) -> bool {
        address >= self.base
            && address
                .checked_add(bytes)
                .is_some_and(|end| end <= self.end())
    }

    #[inline]
    fn card_index(&self, address: usize) -> usize {
        (address - self.base) >> self.card_shift
    }

    /// Mark the cards overlapping `[address, address + bytes)` dirty
    ///
    /// Returns the number of cards that were clean before.
    pub fn dirty_range(&self, address: usize, bytes: usize) -> Result<usize> {
        if !self.covers(address, bytes) {
            return Err(FwbError::AddressOutOfRange { address, bytes });
        }

        if bytes == 0 {
            return Ok(0);
        }

        let first = self.card_index(address);
        let last = self.card_index(address + bytes - 1);
        let mut newly_dirty = 0;
        for card in &self.cards[first..=last] {
            if card.swap(DIRTY, Ordering::Release) == CLEAN {
                newly_dirty += 1;
            }
        }

        Ok(newly_dirty)
    }

    /// Whether the card holding `address` is dirty
    pub fn is_dirty(&self, address: usize) -> Result<bool> {
        if !self.covers(address, 1) {
            return Err(FwbError::AddressOutOfRange { address, bytes: 1 });
        }

        Ok(self.cards[self.card_index(address)].load(Ordering::Acquire) == DIRTY)
    }

    /// Number of dirty cards
    pub fn dirty_card_count(&self) -> usize {
        self.cards
            .iter()
            .filter(|card| card.load(Ordering::Acquire) == DIRTY)
            .count()
    }

    /// Clean every dirty card, passing the heap range of each one to `f`
    ///
    /// Ranges are clipped to the covered range and reported in address
    /// order. Returns the number of cards drained.
    pub fn drain_dirty<F: FnMut(usize, usize)>(&self, mut f: F) -> usize {
        let start_time = Instant::now();
        let card_size = self.card_size();
        let end = self.end();
        let mut drained = 0;

        for (index, card) in self.cards.iter().enumerate() {
            if card.swap(CLEAN, Ordering::Acquire) == DIRTY {
                let start = self.base + (index << self.card_shift);
                let card_end = (start + card_size).min(end);
                f(start, card_end - start);
                drained += 1;
            }
        }

        let duration_us = start_time.elapsed().as_micros() as u64;
        log::debug!(
            "Drained {} dirty cards from table {:#x} in {} us",
            drained,
            self.base,
            duration_us
        );
        log_event(BarrierEvent::CardScan {
            base: self.base,
            dirty_cards: drained,
            duration_us,
        });

        drained
    }

    /// Clean every card
    pub fn clear(&self) {
        for card in self.cards.iter() {
            card.store(CLEAN, Ordering::Release);
        }
    }
}

impl std::fmt::Debug for CardTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardTable")
            .field("base", &format_args!("{:#x}", self.base))
            .field("len", &self.len)
            .field("card_size", &self.card_size())
            .field("dirty_cards", &self.dirty_card_count())
            .finish()
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

lazy_static::lazy_static! {
    static ref CARD_TABLES: RwLock<Vec<Arc<CardTable>>> = RwLock::new(Vec::new());
}

/// Start recording barrier hits inside `table`'s range
///
/// Tables may overlap; a write into the overlap dirties both.
pub fn register_card_table(table: Arc<CardTable>) {
    log_event(BarrierEvent::CardTableRegistered {
        base: table.base(),
        len: table.len(),
        card_size: table.card_size(),
    });
    CARD_TABLES.write().push(table);
}

/// Stop recording into `table`. Returns false if it was not registered.
pub fn unregister_card_table(table: &Arc<CardTable>) -> bool {
    let mut tables = CARD_TABLES.write();
    let Some(position) = tables.iter().position(|t| Arc::ptr_eq(t, table)) else {
        return false;
    };

    tables.swap_remove(position);
    drop(tables);

    log_event(BarrierEvent::CardTableUnregistered { base: table.base() });
    true
}

/// Number of registered tables
pub fn registered_card_tables() -> usize {
    CARD_TABLES.read().len()
}

/// Manager that records hits in the registered card tables
///
/// A notification is clipped against every registered table; bytes outside
/// all of them make it count as an unrecorded write. Bytes inside several
/// overlapping tables dirty each of them but count as covered once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardTableBarrier;

impl WriteBarrierManager for CardTableBarrier {
    fn write_barrier(address: *const u8, bytes: usize) {
        let start = address as usize;
        let end = start.saturating_add(bytes);
        let mut cards = 0;

        let covered = {
            let tables = CARD_TABLES.read();
            for table in tables.iter() {
                let lo = start.max(table.base());
                let hi = end.min(table.end());
                if lo < hi {
                    cards += table.dirty_range(lo, hi - lo).unwrap_or(0);
                }
            }
            covered_bytes(tables.iter().map(|t| (t.base(), t.end())), start, end)
        };

        if let Some(stats) = stats::global() {
            stats.record_notify(bytes, cards);
            if covered < bytes {
                stats.record_unrecorded();
            }
        }

        if covered < bytes {
            log::trace!(
                "Unrecorded write barrier: {:#x}+{} ({} bytes covered)",
                start,
                bytes,
                covered
            );
        }
    }
}

/// Bytes of `[start, end)` inside at least one of `ranges`
///
/// Overlapping ranges count once. Allocation free, quadratic in the number
/// of ranges.
fn covered_bytes<I>(ranges: I, start: usize, end: usize) -> usize
where
    I: Iterator<Item = (usize, usize)> + Clone,
{
    let mut cursor = start;
    let mut covered = 0;

    while cursor < end {
        let reach = ranges
            .clone()
            .filter(|&(lo, hi)| lo <= cursor && cursor < hi)
            .map(|(_, hi)| hi)
            .max();

        match reach {
            Some(hi) => {
                let hi = hi.min(end);
                covered += hi - cursor;
                cursor = hi;
            },
            None => {
                // Jump over the gap to the next range, if any
                match ranges.clone().map(|(lo, _)| lo).filter(|&lo| lo > cursor).min() {
                    Some(lo) => cursor = lo,
                    None => break,
                }
            },
        }
    }

    covered
}
