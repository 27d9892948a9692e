//! Tracked Pointer - Barriered Field Storage
//!
//! `TrackedPtr<T, M>` stores a `*mut T` inside collector-visible memory.
//! Every store through the public API is followed by exactly one
//! notification of the barrier manager `M`, covering the pointer's own
//! address. Reads never notify.
//!
//! Operations that would let a store bypass the barrier are missing from
//! the API rather than checked at runtime:
//!
//! - no mutable address-of (only [`TrackedPtr::as_ptr`], which is read-only)
//! - no `DerefMut`
//! - no `Clone` / `Copy`, so a field cannot be overwritten by `=` with a copy
//!   of another field
//!
//! ```compile_fail
//! use fwb::TrackedPtr;
//!
//! let mut field: TrackedPtr<u8> = TrackedPtr::null();
//! let _slot: *mut *mut u8 = field.as_mut_ptr();
//! ```
//!
//! ```compile_fail
//! use fwb::TrackedPtr;
//!
//! let field: TrackedPtr<u8> = TrackedPtr::null();
//! let _copy = field.clone();
//! ```
//!
//! Bulk operations over arrays of tracked pointers live here as associated
//! functions. Each one issues a single notification over the whole
//! destination range, except clearing, which only stores nulls and never
//! notifies.

use crate::barrier::{self, DefaultBarrier, WriteBarrierManager};
use crate::error::{FwbError, Result};
use crate::ptr::BarrierPtr;
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::ops::Range;
use std::ptr;

/// Pointer field whose assignments notify the collector
///
/// # Examples
///
/// ```rust
/// use fwb::barrier::NoBarrier;
/// use fwb::TrackedPtr;
///
/// let mut target = 42u32;
/// let mut field: TrackedPtr<u32, NoBarrier> = TrackedPtr::null();
/// assert!(field.is_null());
///
/// field.set(&mut target);
/// assert_eq!(unsafe { *field.get() }, 42);
/// ```
#[repr(transparent)]
pub struct TrackedPtr<T, M: WriteBarrierManager = DefaultBarrier> {
    ptr: *mut T,
    _manager: PhantomData<M>,
}

impl<T, M: WriteBarrierManager> TrackedPtr<T, M> {
    /// Null pointer. Does not notify.
    #[inline]
    pub const fn null() -> Self {
        Self {
            ptr: ptr::null_mut(),
            _manager: PhantomData,
        }
    }

    /// Wrap `ptr` without notifying
    ///
    /// # Safety
    ///
    /// The new field must not be visible to a concurrent mark yet, e.g.
    /// because the object holding it is still being initialized.
    #[inline]
    pub const unsafe fn new_unbarriered(ptr: *mut T) -> Self {
        Self {
            ptr,
            _manager: PhantomData,
        }
    }

    /// Current pointer value
    #[inline(always)]
    pub fn get(&self) -> *mut T {
        self.ptr
    }

    #[inline(always)]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Read-only address of the stored pointer
    #[inline(always)]
    pub fn as_ptr(&self) -> *const *mut T {
        &self.ptr
    }

    /// Dereference the stored pointer
    ///
    /// # Safety
    ///
    /// The pointer must be null or point to a live `T` for the duration of
    /// the returned borrow.
    #[inline]
    pub unsafe fn as_ref(&self) -> Option<&T> {
        self.ptr.as_ref()
    }

    /// Store `ptr` and notify
    #[inline]
    pub fn set(&mut self, ptr: *mut T) {
        self.ptr = ptr;
        self.notify();
    }

    /// Store the value of another tracked pointer and notify
    #[inline]
    pub fn assign<N: WriteBarrierManager>(&mut self, other: &TrackedPtr<T, N>) {
        self.set(other.get());
    }

    /// Store `ptr`, notify and return the previous value
    #[inline]
    pub fn replace(&mut self, ptr: *mut T) -> *mut T {
        let old = self.ptr;
        self.set(ptr);
        old
    }

    /// Store `ptr` without notifying
    ///
    /// # Safety
    ///
    /// The field must not be reachable by a concurrent mark, or the caller
    /// must notify for it before the mark can observe the new value.
    #[inline]
    pub unsafe fn set_unbarriered(&mut self, ptr: *mut T) {
        self.ptr = ptr;
    }

    #[inline(always)]
    fn notify(&self) {
        barrier::notify::<M>(self.as_ptr().cast(), size_of::<*mut T>());
    }

    #[inline(always)]
    fn notify_range(dst: *const Self, count: usize) {
        barrier::notify::<M>(dst.cast(), size_of::<Self>() * count);
    }

    // ------------------------------------------------------------------
    // Arrays
    // ------------------------------------------------------------------

    /// Move `count` elements from `src` to `dst`, then notify once over the
    /// destination
    ///
    /// # Safety
    ///
    /// Both ranges must be valid for `count` elements. They may overlap.
    pub unsafe fn move_array(dst: *mut Self, src: *const Self, count: usize) {
        ptr::copy(src, dst, count);
        Self::notify_range(dst, count);
    }

    /// Copy `src_count` raw pointers into `dst`, then notify once over all
    /// `dst_count` destination elements
    ///
    /// # Safety
    ///
    /// `dst` must be valid for `dst_count` elements, `src` for `src_count`,
    /// the ranges must not overlap and `src_count <= dst_count`.
    pub unsafe fn copy_array_from_raw(
        dst: *mut Self,
        dst_count: usize,
        src: *const *mut T,
        src_count: usize,
    ) {
        debug_assert!(src_count <= dst_count, "copy of {} elements into {}", src_count, dst_count);
        ptr::copy_nonoverlapping(src, dst.cast::<*mut T>(), src_count);
        Self::notify_range(dst, dst_count);
    }

    /// Copy `src_count` tracked pointers into `dst`, then notify once over
    /// all `dst_count` destination elements
    ///
    /// # Safety
    ///
    /// Same contract as [`TrackedPtr::copy_array_from_raw`].
    pub unsafe fn copy_array(dst: *mut Self, dst_count: usize, src: *const Self, src_count: usize) {
        debug_assert!(src_count <= dst_count, "copy of {} elements into {}", src_count, dst_count);
        ptr::copy_nonoverlapping(src, dst, src_count);
        Self::notify_range(dst, dst_count);
    }

    /// Null out `count` elements. Never notifies: a null store cannot hide
    /// a live object from the mark.
    ///
    /// # Safety
    ///
    /// `dst` must be valid for `count` elements.
    pub unsafe fn clear_array(dst: *mut Self, count: usize) {
        ptr::write_bytes(dst, 0, count);
    }

    /// Move the elements in `src` to the range starting at `dest`, within
    /// one slice
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fwb::barrier::NoBarrier;
    /// use fwb::TrackedPtr;
    ///
    /// let mut values = [1u8, 2, 3];
    /// let mut slots: Vec<TrackedPtr<u8, NoBarrier>> = values
    ///     .iter_mut()
    ///     .map(|v| unsafe { TrackedPtr::new_unbarriered(v) })
    ///     .collect();
    ///
    /// TrackedPtr::move_within(&mut slots, 0..2, 1).unwrap();
    /// assert_eq!(unsafe { *slots[2].get() }, 2);
    /// ```
    pub fn move_within(slice: &mut [Self], src: Range<usize>, dest: usize) -> Result<()> {
        let length = slice.len();
        crate::ensure!(
            src.start <= src.end && src.end <= length,
            FwbError::RangeOutOfBounds {
                start: src.start,
                end: src.end,
                length,
            }
        );

        let count = src.end - src.start;
        crate::ensure!(
            dest <= length && count <= length - dest,
            FwbError::RangeOutOfBounds {
                start: dest,
                end: dest.saturating_add(count),
                length,
            }
        );

        let base = slice.as_mut_ptr();
        // SAFETY: both ranges were checked against the slice length
        unsafe { Self::move_array(base.add(dest), base.add(src.start), count) };
        Ok(())
    }

    /// Copy raw pointers into the front of `dst`, then notify once over all
    /// of `dst`
    pub fn copy_from_raw_slice(dst: &mut [Self], src: &[*mut T]) -> Result<()> {
        crate::ensure!(
            src.len() <= dst.len(),
            FwbError::LengthMismatch {
                dst: dst.len(),
                src: src.len(),
            }
        );

        // SAFETY: lengths checked, and a shared and a mutable borrow never
        // overlap
        unsafe { Self::copy_array_from_raw(dst.as_mut_ptr(), dst.len(), src.as_ptr(), src.len()) };
        Ok(())
    }

    /// Copy tracked pointers into the front of `dst`, then notify once over
    /// all of `dst`
    pub fn copy_from_tracked_slice(dst: &mut [Self], src: &[Self]) -> Result<()> {
        crate::ensure!(
            src.len() <= dst.len(),
            FwbError::LengthMismatch {
                dst: dst.len(),
                src: src.len(),
            }
        );

        // SAFETY: as above
        unsafe { Self::copy_array(dst.as_mut_ptr(), dst.len(), src.as_ptr(), src.len()) };
        Ok(())
    }

    /// Null out every element of `dst` without notifying
    pub fn clear_slice(dst: &mut [Self]) {
        // SAFETY: the slice is valid for its length
        unsafe { Self::clear_array(dst.as_mut_ptr(), dst.len()) };
    }
}

impl<T, M: WriteBarrierManager> Default for TrackedPtr<T, M> {
    #[inline]
    fn default() -> Self {
        Self::null()
    }
}

impl<T, M: WriteBarrierManager> BarrierPtr<T> for TrackedPtr<T, M> {
    const TRACKED: bool = true;

    #[inline(always)]
    fn get(&self) -> *mut T {
        self.ptr
    }

    #[inline]
    fn set(&mut self, ptr: *mut T) {
        TrackedPtr::set(self, ptr);
    }

    #[inline]
    unsafe fn set_unbarriered(&mut self, ptr: *mut T) {
        TrackedPtr::set_unbarriered(self, ptr);
    }

    #[inline]
    unsafe fn from_raw_unbarriered(ptr: *mut T) -> Self {
        Self::new_unbarriered(ptr)
    }
}

impl<T, M: WriteBarrierManager> fmt::Debug for TrackedPtr<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackedPtr({:p})", self.ptr)
    }
}

impl<T, M: WriteBarrierManager> fmt::Pointer for TrackedPtr<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.ptr, f)
    }
}

impl<T, M: WriteBarrierManager> PartialEq for TrackedPtr<T, M> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T, M: WriteBarrierManager> Eq for TrackedPtr<T, M> {}

impl<T, M: WriteBarrierManager> PartialEq<*mut T> for TrackedPtr<T, M> {
    #[inline]
    fn eq(&self, other: &*mut T) -> bool {
        self.ptr == *other
    }
}
