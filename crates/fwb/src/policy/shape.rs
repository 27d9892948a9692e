//! Element Shape Classifier
//!
//! Classifies element types as pointer-shaped (may hold a reference the
//! collector has to trace) or opaque. Classification is closed-world: a type
//! is only usable as a field or array element once it implements
//! [`ElementShape`], and only raw pointers, [`TrackedPtr`] and the
//! [`WriteBarrierPolicy`] tag are pointer-shaped. Primitives are classified
//! here; other opaque types opt in with [`opaque_element!`].
//!
//! [`opaque_element!`]: crate::opaque_element

use super::{BarrierPolicy, NoWriteBarrierPolicy, Sealed, WriteBarrierPolicy};
use crate::barrier::{self, WriteBarrierManager};
use crate::ptr::{PlainField, PlainPtr, TrackedPtr};
use std::mem::size_of;

/// Runtime view of an element shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeClass {
    /// No collector-visible pointers
    Opaque,
    /// A raw pointer or an already tracked pointer
    PointerShaped,
}

/// Type-level element shape: [`OpaqueShape`] or [`PointerShape`]
pub trait ShapeKind: Sealed + 'static {
    const CLASS: ShapeClass;

    /// Barrier policy of the shape on its own, before the allocator is
    /// taken into account
    type Policy: BarrierPolicy;
}

/// Shape of types without collector-visible pointers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpaqueShape;

/// Shape of raw pointers and tracked pointers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerShape;

impl Sealed for OpaqueShape {}
impl Sealed for PointerShape {}

impl ShapeKind for OpaqueShape {
    const CLASS: ShapeClass = ShapeClass::Opaque;
    type Policy = NoWriteBarrierPolicy;
}

impl ShapeKind for PointerShape {
    const CLASS: ShapeClass = ShapeClass::PointerShaped;
    type Policy = WriteBarrierPolicy;
}

/// How an element is stored: [`Unbarriered`] or [`Barriered`]
///
/// Raw bulk memory primitives only accept [`Unbarriered`] storage.
pub trait StorageKind: Sealed + 'static {}

/// Storage that may be written with raw memory operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unbarriered;

/// Storage whose writes must go through a barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Barriered;

impl Sealed for Unbarriered {}
impl Sealed for Barriered {}
impl StorageKind for Unbarriered {}
impl StorageKind for Barriered {}

/// Classification of a field or array element type
pub trait ElementShape: Sized {
    /// Pointer-shaped or opaque
    type Shape: ShapeKind;

    /// Policy of this element inside a non-leaf allocation.
    ///
    /// Non-leaf allocations barrier every element type, with the single
    /// exception of `i32`.
    type NonLeafPolicy: BarrierPolicy;

    /// Whether raw bulk memory operations may write this type
    type Storage: StorageKind;

    /// Array storage when the element must be tracked under manager `M`
    type Tracked<M: WriteBarrierManager>;

    /// Report `count` elements just written at `address` by a bulk copy
    ///
    /// `P` and `M` are the policy and manager resolved for the destination
    /// allocator. Tracked storage ignores both and always notifies its own
    /// manager.
    #[inline(always)]
    fn bulk_write_barrier<P: BarrierPolicy, M: WriteBarrierManager>(
        address: *const Self,
        count: usize,
    ) {
        P::array_write_barrier::<Self, M>(address, count);
    }
}

/// Policy implied by the shape of `T` alone
pub type ShapePolicy<T> = <<T as ElementShape>::Shape as ShapeKind>::Policy;

/// Classify `T`
///
/// # Examples
///
/// ```rust
/// use fwb::policy::{classify, ShapeClass};
/// use fwb::TrackedPtr;
///
/// assert_eq!(classify::<u64>(), ShapeClass::Opaque);
/// assert_eq!(classify::<*mut u64>(), ShapeClass::PointerShaped);
/// assert_eq!(classify::<TrackedPtr<u64>>(), ShapeClass::PointerShaped);
/// ```
#[inline]
pub const fn classify<T: ElementShape>() -> ShapeClass {
    <T::Shape as ShapeKind>::CLASS
}

/// Classify types as opaque elements
///
/// Opaque elements never need a barrier in managed allocations, but do in
/// non-leaf allocations.
///
/// # Examples
///
/// ```rust
/// use fwb::opaque_element;
/// use fwb::policy::{classify, ShapeClass};
///
/// #[derive(Clone, Copy)]
/// struct Span {
///     start: u32,
///     end: u32,
/// }
///
/// opaque_element!(Span);
///
/// assert_eq!(classify::<Span>(), ShapeClass::Opaque);
/// ```
#[macro_export]
macro_rules! opaque_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::policy::ElementShape for $t {
                type Shape = $crate::policy::OpaqueShape;
                type NonLeafPolicy = $crate::policy::WriteBarrierPolicy;
                type Storage = $crate::policy::Unbarriered;
                type Tracked<M: $crate::barrier::WriteBarrierManager> = $t;
            }
        )*
    };
}

opaque_element!(
    (), bool, char, f32, f64, u8, u16, u32, u64, u128, usize, i8, i16, i64, i128, isize,
);

// The only scalar exempt from non-leaf barriers. Other scalars are just as
// pointer-free but keep the barrier.
impl ElementShape for i32 {
    type Shape = OpaqueShape;
    type NonLeafPolicy = NoWriteBarrierPolicy;
    type Storage = Unbarriered;
    type Tracked<M: WriteBarrierManager> = i32;
}

impl<T> ElementShape for *mut T {
    type Shape = PointerShape;
    type NonLeafPolicy = WriteBarrierPolicy;
    type Storage = Unbarriered;
    type Tracked<M: WriteBarrierManager> = TrackedPtr<T, M>;
}

impl<T> ElementShape for *const T {
    type Shape = PointerShape;
    type NonLeafPolicy = WriteBarrierPolicy;
    type Storage = Unbarriered;
    type Tracked<M: WriteBarrierManager> = TrackedPtr<T, M>;
}

// Already tracked: wrapping again yields the same type, and bulk copies
// notify the wrapper's own manager whatever the allocator resolves to.
impl<T, N: WriteBarrierManager> ElementShape for TrackedPtr<T, N> {
    type Shape = PointerShape;
    type NonLeafPolicy = WriteBarrierPolicy;
    type Storage = Barriered;
    type Tracked<M: WriteBarrierManager> = TrackedPtr<T, N>;

    #[inline(always)]
    fn bulk_write_barrier<P: BarrierPolicy, M: WriteBarrierManager>(
        address: *const Self,
        count: usize,
    ) {
        barrier::notify::<N>(address.cast(), size_of::<Self>() * count);
    }
}

// Policy override carrier: resolving a policy for the tag itself forces the
// barrier wherever the allocator allows one.
impl ElementShape for WriteBarrierPolicy {
    type Shape = PointerShape;
    type NonLeafPolicy = WriteBarrierPolicy;
    type Storage = Unbarriered;
    type Tracked<M: WriteBarrierManager> = WriteBarrierPolicy;
}

impl<T> ElementShape for PlainPtr<T> {
    type Shape = OpaqueShape;
    type NonLeafPolicy = WriteBarrierPolicy;
    type Storage = Unbarriered;
    type Tracked<M: WriteBarrierManager> = PlainPtr<T>;
}

impl<T> ElementShape for PlainField<T> {
    type Shape = OpaqueShape;
    type NonLeafPolicy = WriteBarrierPolicy;
    type Storage = Unbarriered;
    type Tracked<M: WriteBarrierManager> = PlainField<T>;
}
