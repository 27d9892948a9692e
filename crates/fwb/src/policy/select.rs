//! Wrapper Type Selection
//!
//! Maps an (element type, allocator) pair to the type used to store it.
//! Selection only picks the storage representation; notifying is the job of
//! the selected wrapper.
//!
//! ```rust
//! use fwb::policy::{FieldPtr, ArrayItem, ManagedAllocator, LeafAllocator, NonLeafAllocator};
//! use fwb::{PlainPtr, TrackedPtr};
//!
//! struct Node {
//!     // Barriered field: assignments notify the collector
//!     next: FieldPtr<Node, ManagedAllocator>,
//!     // Plain field: assignments are ordinary stores
//!     name: FieldPtr<u8, LeafAllocator>,
//! }
//!
//! // Array of pointers in managed memory is stored as tracked pointers
//! let _slots: Vec<ArrayItem<*mut Node, ManagedAllocator>> = Vec::new();
//! // Non-pointer elements keep their type
//! let _counts: Vec<ArrayItem<u64, NonLeafAllocator>> = vec![0u64; 4];
//! ```

use super::allocator::{AllocatorIdentity, AllocatorTag};
use super::BarrierPolicy;

/// Combined policy for elements of type `T` allocated by `A`
pub type ElementPolicyOf<A, T> =
    <<A as AllocatorIdentity>::Tag as AllocatorTag>::ElementPolicy<T>;

/// Barrier manager notified for writes into memory of allocator `A`
pub type BarrierOf<A> = <<A as AllocatorIdentity>::Tag as AllocatorTag>::Barrier;

/// Field wrapper for a pointer to `T` stored in memory of allocator `A`:
/// [`TrackedPtr`](crate::TrackedPtr) or [`PlainPtr`](crate::PlainPtr)
pub type FieldPtr<T, A> = <ElementPolicyOf<A, *mut T> as BarrierPolicy>::Ptr<T, BarrierOf<A>>;

/// Array element storage for element type `T` in memory of allocator `A`
///
/// A pointer element `*mut U` becomes `TrackedPtr<U, _>` when the pair needs
/// a barrier; a tracked pointer stays as it is; everything else is `T`.
pub type ArrayItem<T, A> = <ElementPolicyOf<A, T> as BarrierPolicy>::ArrayItem<T, BarrierOf<A>>;
