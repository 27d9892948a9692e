//! Policy Module - Compile-Time Write Barrier Decisions
//!
//! Decides, per (allocator, element type) pair, whether writes to a location
//! must notify the collector. The decision is made entirely by the type
//! system:
//!
//! ```text
//!   element type T ──► ElementShape ──► ShapeKind::Policy ─┐
//!                                                          ├─► And ──► BarrierPolicy
//!   allocator A ──► AllocatorIdentity::Tag ──► Policy ─────┘            │
//!                                                                       ▼
//!                                                  Ptr<T, M> / ArrayItem<T, M>
//!                                                  TrackedPtr    or   plain storage
//! ```
//!
//! A policy is one of two zero-sized marker types, [`WriteBarrierPolicy`]
//! and [`NoWriteBarrierPolicy`]. Combination ([`And`]) and wrapper selection
//! are generic associated types on [`BarrierPolicy`], so resolving a policy
//! costs nothing at runtime and a given pair always resolves to the same
//! types.

pub mod allocator;
pub mod select;
pub mod shape;

pub use allocator::{
    allocator_kind, allocator_requires, AllocatorIdentity, AllocatorKind, AllocatorTag, HeapAllocator,
    LeafAllocator, ManagedAllocator, NonLeafAllocator,
};
pub use select::{ArrayItem, BarrierOf, ElementPolicyOf, FieldPtr};
pub use shape::{
    classify, Barriered, ElementShape, OpaqueShape, PointerShape, ShapeClass, ShapeKind,
    ShapePolicy, StorageKind, Unbarriered,
};

use crate::barrier::{self, WriteBarrierManager};
use crate::ptr::{BarrierPtr, PlainPtr, TrackedPtr};
use std::mem::size_of;

mod sealed {
    pub trait Sealed {}
}

pub(crate) use sealed::Sealed;

/// A write barrier policy: either [`WriteBarrierPolicy`] or
/// [`NoWriteBarrierPolicy`].
///
/// Sealed; the set of policies is closed.
pub trait BarrierPolicy: Sealed + 'static {
    /// Whether writes under this policy notify the collector
    const REQUIRES_BARRIER: bool;

    /// Type-level AND with another policy
    type And<P: BarrierPolicy>: BarrierPolicy;

    /// Field wrapper for a pointer to `T`
    type Ptr<T, M: WriteBarrierManager>: BarrierPtr<T>;

    /// Array element storage for element type `T`
    type ArrayItem<T: ElementShape, M: WriteBarrierManager>;

    /// Notify `M` that `count` elements of `T` at `address` changed, if this
    /// policy requires it.
    fn array_write_barrier<T, M: WriteBarrierManager>(address: *const T, count: usize);
}

/// Writes must notify the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteBarrierPolicy;

/// Writes never notify the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoWriteBarrierPolicy;

impl Sealed for WriteBarrierPolicy {}
impl Sealed for NoWriteBarrierPolicy {}

impl BarrierPolicy for WriteBarrierPolicy {
    const REQUIRES_BARRIER: bool = true;

    type And<P: BarrierPolicy> = P;

    type Ptr<T, M: WriteBarrierManager> = TrackedPtr<T, M>;

    type ArrayItem<T: ElementShape, M: WriteBarrierManager> = T::Tracked<M>;

    #[inline(always)]
    fn array_write_barrier<T, M: WriteBarrierManager>(address: *const T, count: usize) {
        barrier::notify::<M>(address.cast(), size_of::<T>() * count);
    }
}

impl BarrierPolicy for NoWriteBarrierPolicy {
    const REQUIRES_BARRIER: bool = false;

    type And<P: BarrierPolicy> = NoWriteBarrierPolicy;

    type Ptr<T, M: WriteBarrierManager> = PlainPtr<T>;

    type ArrayItem<T: ElementShape, M: WriteBarrierManager> = T;

    #[inline(always)]
    fn array_write_barrier<T, M: WriteBarrierManager>(_address: *const T, _count: usize) {}
}

/// Combined policy of `A` and `B`: barriered only if both are.
pub type And<A, B> = <A as BarrierPolicy>::And<B>;

/// Whether elements of type `T` allocated by `A` need write barriers
///
/// # Examples
///
/// ```rust
/// use fwb::policy::{requires_barrier, LeafAllocator, ManagedAllocator, NonLeafAllocator};
///
/// assert!(requires_barrier::<ManagedAllocator, *mut u8>());
/// assert!(!requires_barrier::<ManagedAllocator, u64>());
/// assert!(requires_barrier::<NonLeafAllocator, u64>());
/// assert!(!requires_barrier::<NonLeafAllocator, i32>());
/// assert!(!requires_barrier::<LeafAllocator, *mut u8>());
/// ```
#[inline]
pub const fn requires_barrier<A: AllocatorIdentity, T: ElementShape>() -> bool {
    <ElementPolicyOf<A, T> as BarrierPolicy>::REQUIRES_BARRIER
}
