//! Memory Operations - Bulk Copies Under the Barrier Policy
//!
//! Two layers:
//!
//! 1. Raw primitives ([`copy_memory`], [`move_memory`], [`zero_memory`]).
//!    They never notify and only accept element types whose storage may be
//!    written behind the collector's back ([`RawBulk`]). Calling them on an
//!    array of [`TrackedPtr`](crate::TrackedPtr) does not compile:
//!
//!    ```compile_fail
//!    use fwb::memory::copy_memory;
//!    use fwb::TrackedPtr;
//!
//!    let src: [TrackedPtr<u8>; 2] = [TrackedPtr::null(), TrackedPtr::null()];
//!    let mut dst: [TrackedPtr<u8>; 2] = [TrackedPtr::null(), TrackedPtr::null()];
//!    unsafe { copy_memory(dst.as_mut_ptr(), src.as_ptr(), 2) };
//!    ```
//!
//!    ```compile_fail
//!    use fwb::memory::zero_memory;
//!    use fwb::TrackedPtr;
//!
//!    let mut slots: [TrackedPtr<u8>; 2] = [TrackedPtr::null(), TrackedPtr::null()];
//!    unsafe { zero_memory(slots.as_mut_ptr(), 2) };
//!    ```
//!
//! 2. Policy-driven operations ([`write_barrier`], [`copy_array`],
//!    [`copy_slice`]). The allocator and element type select the policy,
//!    and a barriered copy issues one notification over the destination.
//!
//! # Safety
//!
//! The raw pointer functions are `unsafe`. The caller must ensure that:
//! - Pointers are valid for the given element counts and properly aligned
//! - Ranges do not overlap, except for [`move_memory`]
//!
//! # Example
//!
//! ```rust
//! use fwb::memory::copy_slice;
//! use fwb::policy::ManagedAllocator;
//! use fwb::barrier::NoBarrier;
//!
//! let mut a = 1u32;
//! let mut b = 2u32;
//! let src: [*mut u32; 2] = [&mut a, &mut b];
//! let mut dst: [*mut u32; 3] = [std::ptr::null_mut(); 3];
//!
//! // Pointer-shaped elements in managed memory: one notify over `dst`
//! copy_slice::<_, ManagedAllocator<NoBarrier>>(&mut dst, &src).unwrap();
//! assert_eq!(dst[1], src[1]);
//! assert!(dst[2].is_null());
//! ```

use crate::error::{FwbError, Result};
use crate::policy::{AllocatorIdentity, BarrierOf, ElementPolicyOf, ElementShape, Unbarriered};
use std::ptr;

/// Element types that raw bulk primitives may write
///
/// Implemented for every classified element type whose storage is
/// [`Unbarriered`]; never for tracked pointers.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is barrier-tracked storage and cannot be written with raw memory operations",
    note = "use the `TrackedPtr` array operations or `fwb::memory::copy_array` instead"
)]
pub trait RawBulk: Sized {}

impl<T: ElementShape<Storage = Unbarriered>> RawBulk for T {}

// ============================================================================
// RAW PRIMITIVES
// ============================================================================

/// Copy `count` elements from `src` to `dst` (`memcpy`)
///
/// # Safety
///
/// - `src` must be valid for reads of `count` elements
/// - `dst` must be valid for writes of `count` elements
/// - The ranges must not overlap
#[inline]
pub unsafe fn copy_memory<T: RawBulk>(dst: *mut T, src: *const T, count: usize) {
    if count == 0 {
        return;
    }
    ptr::copy_nonoverlapping(src, dst, count);
}

/// Copy `count` elements from `src` to `dst`, ranges may overlap (`memmove`)
///
/// # Safety
///
/// - `src` must be valid for reads of `count` elements
/// - `dst` must be valid for writes of `count` elements
///
/// # Example
///
/// ```rust
/// use fwb::memory::move_memory;
///
/// let mut buffer = [1u8, 2, 3, 4, 5];
/// unsafe { move_memory(buffer.as_mut_ptr().add(1), buffer.as_ptr(), 4) };
/// assert_eq!(buffer, [1, 1, 2, 3, 4]);
/// ```
#[inline]
pub unsafe fn move_memory<T: RawBulk>(dst: *mut T, src: *const T, count: usize) {
    if count == 0 {
        return;
    }
    ptr::copy(src, dst, count);
}

/// Zero-fill `count` elements at `dst`
///
/// # Safety
///
/// - `dst` must be valid for writes of `count` elements
/// - All-zero bytes must be a valid `T`
#[inline]
pub unsafe fn zero_memory<T: RawBulk>(dst: *mut T, count: usize) {
    if count == 0 {
        return;
    }
    ptr::write_bytes(dst, 0, count);
}

// ============================================================================
// POLICY-DRIVEN OPERATIONS
// ============================================================================

/// Notify the collector that `count` elements of `T` at `address` changed,
/// if elements of `T` allocated by `A` need a barrier
///
/// Arrays of [`TrackedPtr`](crate::TrackedPtr) always notify the pointer's
/// own manager, even in memory whose allocator needs no barrier.
#[inline]
pub fn write_barrier<T: ElementShape, A: AllocatorIdentity>(address: *const T, count: usize) {
    write_barrier_as::<T, A, T>(address, count);
}

/// [`write_barrier`] with the policy resolved for `P` instead of `T`
///
/// Passing [`WriteBarrierPolicy`](crate::policy::WriteBarrierPolicy) as `P`
/// forces the notification for any allocator that manages
/// collector-visible memory, e.g. over a byte buffer known to hold
/// pointers.
///
/// # Example
///
/// ```rust
/// use fwb::memory::write_barrier_as;
/// use fwb::policy::{ManagedAllocator, WriteBarrierPolicy};
///
/// let buffer = [0u8; 64];
/// write_barrier_as::<u8, ManagedAllocator, WriteBarrierPolicy>(buffer.as_ptr(), buffer.len());
/// ```
#[inline]
pub fn write_barrier_as<T: ElementShape, A: AllocatorIdentity, P: ElementShape>(
    address: *const T,
    count: usize,
) {
    T::bulk_write_barrier::<ElementPolicyOf<A, P>, BarrierOf<A>>(address, count);
}

/// Copy `src_count` elements into `dst`, then apply [`write_barrier`] over
/// all `dst_count` destination elements
///
/// # Safety
///
/// - `dst` must be valid for writes of `dst_count` elements
/// - `src` must be valid for reads of `src_count` elements
/// - The ranges must not overlap
/// - `src_count <= dst_count` (only checked in debug builds)
#[inline]
pub unsafe fn copy_array<T: ElementShape, A: AllocatorIdentity>(
    dst: *mut T,
    dst_count: usize,
    src: *const T,
    src_count: usize,
) {
    copy_array_as::<T, A, T>(dst, dst_count, src, src_count);
}

/// [`copy_array`] with the policy resolved for `P` instead of `T`
///
/// # Safety
///
/// Same contract as [`copy_array`].
#[inline]
pub unsafe fn copy_array_as<T: ElementShape, A: AllocatorIdentity, P: ElementShape>(
    dst: *mut T,
    dst_count: usize,
    src: *const T,
    src_count: usize,
) {
    debug_assert!(
        src_count <= dst_count,
        "copy of {} elements into {}",
        src_count,
        dst_count
    );
    ptr::copy_nonoverlapping(src, dst, src_count);
    write_barrier_as::<T, A, P>(dst, dst_count);
}

/// Safe [`copy_array`] over slices: copies `src` into the front of `dst`
pub fn copy_slice<T: ElementShape + Copy, A: AllocatorIdentity>(dst: &mut [T], src: &[T]) -> Result<()> {
    crate::ensure!(
        src.len() <= dst.len(),
        FwbError::LengthMismatch {
            dst: dst.len(),
            src: src.len(),
        }
    );

    // SAFETY: lengths checked, and a shared and a mutable borrow never overlap
    unsafe { copy_array::<T, A>(dst.as_mut_ptr(), dst.len(), src.as_ptr(), src.len()) };
    Ok(())
}
