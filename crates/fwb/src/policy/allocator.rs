//! Allocator Policy Tags
//!
//! A closed vocabulary of allocator identities. Each tag states whether its
//! allocations are visible to the collector and how that combines with the
//! element shape:
//!
//! | Tag                  | Kind      | Element policy                       |
//! |----------------------|-----------|--------------------------------------|
//! | [`HeapAllocator`]    | Unmanaged | never barriered                      |
//! | [`ManagedAllocator`] | Managed   | barriered iff pointer-shaped         |
//! | [`NonLeafAllocator`] | NonLeaf   | always barriered, except `i32`       |
//! | [`LeafAllocator`]    | Leaf      | never barriered                      |
//!
//! Allocator implementations declare their identity once through
//! [`AllocatorIdentity`]; policy resolution never looks at allocator state.

use super::shape::{ElementShape, ShapePolicy};
use super::{And, BarrierPolicy, NoWriteBarrierPolicy, Sealed, WriteBarrierPolicy};
use crate::barrier::{DefaultBarrier, NoBarrier, WriteBarrierManager};
use std::marker::PhantomData;

/// Runtime view of an allocator tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocatorKind {
    /// Ordinary memory, invisible to the collector
    Unmanaged,
    /// The collector's general-purpose allocator
    Managed,
    /// Collector memory for objects that may hold pointers
    NonLeaf,
    /// Collector memory for objects proven pointer-free
    Leaf,
}

/// An allocator identity tag. Sealed; see the module table for the set.
pub trait AllocatorTag: Sealed + 'static {
    const KIND: AllocatorKind;

    /// Whether the allocator itself manages collector-visible memory
    type Policy: BarrierPolicy;

    /// Manager notified for barriered writes into this allocator's memory
    type Barrier: WriteBarrierManager;

    /// Combined policy for elements of type `T`
    type ElementPolicy<T: ElementShape>: BarrierPolicy;
}

/// Static declaration of the identity of an allocator
///
/// # Examples
///
/// ```rust
/// use fwb::policy::{requires_barrier, AllocatorIdentity, LeafAllocator};
///
/// /// Allocator for strings and numeric arrays
/// struct BlobAllocator;
///
/// impl AllocatorIdentity for BlobAllocator {
///     type Tag = LeafAllocator;
/// }
///
/// assert!(!requires_barrier::<BlobAllocator, *mut u8>());
/// ```
pub trait AllocatorIdentity {
    type Tag: AllocatorTag;
}

/// Unmanaged memory: never needs a barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapAllocator;

/// General collector allocator: barrier for pointer-shaped elements
pub struct ManagedAllocator<M: WriteBarrierManager = DefaultBarrier>(PhantomData<M>);

/// Non-leaf collector allocator: barrier for every element except `i32`
pub struct NonLeafAllocator<M: WriteBarrierManager = DefaultBarrier>(PhantomData<M>);

/// Leaf collector allocator: objects without pointers, never a barrier
pub struct LeafAllocator<M: WriteBarrierManager = DefaultBarrier>(PhantomData<M>);

impl Sealed for HeapAllocator {}
impl<M: WriteBarrierManager> Sealed for ManagedAllocator<M> {}
impl<M: WriteBarrierManager> Sealed for NonLeafAllocator<M> {}
impl<M: WriteBarrierManager> Sealed for LeafAllocator<M> {}

impl AllocatorTag for HeapAllocator {
    const KIND: AllocatorKind = AllocatorKind::Unmanaged;
    type Policy = NoWriteBarrierPolicy;
    type Barrier = NoBarrier;
    type ElementPolicy<T: ElementShape> = And<NoWriteBarrierPolicy, ShapePolicy<T>>;
}

impl<M: WriteBarrierManager> AllocatorTag for ManagedAllocator<M> {
    const KIND: AllocatorKind = AllocatorKind::Managed;
    type Policy = WriteBarrierPolicy;
    type Barrier = M;
    type ElementPolicy<T: ElementShape> = And<WriteBarrierPolicy, ShapePolicy<T>>;
}

impl<M: WriteBarrierManager> AllocatorTag for NonLeafAllocator<M> {
    const KIND: AllocatorKind = AllocatorKind::NonLeaf;
    type Policy = WriteBarrierPolicy;
    type Barrier = M;
    // Resolved before the general rule, not ANDed with the shape.
    type ElementPolicy<T: ElementShape> = T::NonLeafPolicy;
}

impl<M: WriteBarrierManager> AllocatorTag for LeafAllocator<M> {
    const KIND: AllocatorKind = AllocatorKind::Leaf;
    type Policy = NoWriteBarrierPolicy;
    type Barrier = M;
    type ElementPolicy<T: ElementShape> = And<NoWriteBarrierPolicy, ShapePolicy<T>>;
}

impl AllocatorIdentity for HeapAllocator {
    type Tag = Self;
}

impl<M: WriteBarrierManager> AllocatorIdentity for ManagedAllocator<M> {
    type Tag = Self;
}

impl<M: WriteBarrierManager> AllocatorIdentity for NonLeafAllocator<M> {
    type Tag = Self;
}

impl<M: WriteBarrierManager> AllocatorIdentity for LeafAllocator<M> {
    type Tag = Self;
}

/// Whether allocator `A` manages collector-visible memory at all
#[inline]
pub const fn allocator_requires<A: AllocatorIdentity>() -> bool {
    <<A::Tag as AllocatorTag>::Policy as BarrierPolicy>::REQUIRES_BARRIER
}

/// Kind of allocator `A`
#[inline]
pub const fn allocator_kind<A: AllocatorIdentity>() -> AllocatorKind {
    <A::Tag as AllocatorTag>::KIND
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::requires_barrier;

    struct Node;

    struct StringAllocator;

    impl AllocatorIdentity for StringAllocator {
        type Tag = LeafAllocator;
    }

    #[test]
    fn test_allocator_requires() {
        assert!(!allocator_requires::<HeapAllocator>());
        assert!(allocator_requires::<ManagedAllocator>());
        assert!(allocator_requires::<NonLeafAllocator>());
        assert!(!allocator_requires::<LeafAllocator>());
    }

    #[test]
    fn test_allocator_kind() {
        assert_eq!(allocator_kind::<HeapAllocator>(), AllocatorKind::Unmanaged);
        assert_eq!(allocator_kind::<ManagedAllocator>(), AllocatorKind::Managed);
        assert_eq!(allocator_kind::<NonLeafAllocator>(), AllocatorKind::NonLeaf);
        assert_eq!(allocator_kind::<LeafAllocator>(), AllocatorKind::Leaf);
        assert_eq!(allocator_kind::<StringAllocator>(), AllocatorKind::Leaf);
    }

    #[test]
    fn test_non_leaf_exception() {
        assert!(!requires_barrier::<NonLeafAllocator, i32>());
        assert!(requires_barrier::<NonLeafAllocator, i64>());
        assert!(requires_barrier::<NonLeafAllocator, u32>());
        assert!(requires_barrier::<NonLeafAllocator, f64>());
        assert!(requires_barrier::<NonLeafAllocator, *mut Node>());
    }

    #[test]
    fn test_i32_exception_is_non_leaf_only() {
        assert!(!requires_barrier::<ManagedAllocator, i32>());
        assert!(!requires_barrier::<LeafAllocator, i32>());
        assert!(!requires_barrier::<HeapAllocator, i32>());
    }

    #[test]
    fn test_declared_identity_follows_tag() {
        assert!(!requires_barrier::<StringAllocator, *mut Node>());
        assert!(!allocator_requires::<StringAllocator>());
    }
}
