//! Pointer Wrappers
//!
//! Storage types selected by the policy layer for fields and array elements:
//!
//! - [`TrackedPtr`] - pointer whose every assignment notifies the collector
//! - [`PlainPtr`] - pointer with ordinary assignment
//! - [`PlainField`] - non-pointer value with ordinary assignment
//!
//! Code generic over the selected field type uses [`BarrierPtr`], which both
//! pointer wrappers implement.

pub mod plain;
pub mod tracked;

pub use plain::{PlainField, PlainPtr};
pub use tracked::TrackedPtr;

/// Uniform interface over the pointer wrappers
///
/// `set` is the only way to store through a `BarrierPtr` without `unsafe`,
/// and for a tracked pointer it always notifies.
///
/// # Examples
///
/// ```rust
/// use fwb::policy::{FieldPtr, LeafAllocator, ManagedAllocator};
/// use fwb::ptr::BarrierPtr;
///
/// fn link<P: BarrierPtr<u64>>(field: &mut P, target: &mut u64) {
///     field.set(target);
/// }
///
/// let mut value = 7u64;
/// let mut tracked: FieldPtr<u64, ManagedAllocator> = Default::default();
/// let mut plain: FieldPtr<u64, LeafAllocator> = Default::default();
///
/// link(&mut tracked, &mut value);
/// link(&mut plain, &mut value);
/// assert_eq!(tracked.get(), plain.get());
/// ```
pub trait BarrierPtr<T>: Default {
    /// Whether stores through this wrapper notify the collector
    const TRACKED: bool;

    /// Current pointer value
    fn get(&self) -> *mut T;

    /// Store `ptr`, notifying the collector if the wrapper is tracked
    fn set(&mut self, ptr: *mut T);

    /// Store `ptr` without notifying
    ///
    /// # Safety
    ///
    /// The location must not be reachable by a concurrent mark, or the
    /// caller must notify the collector for it before the mark can observe
    /// the new value.
    unsafe fn set_unbarriered(&mut self, ptr: *mut T);

    /// Wrap `ptr` without notifying
    ///
    /// # Safety
    ///
    /// Same contract as [`BarrierPtr::set_unbarriered`].
    unsafe fn from_raw_unbarriered(ptr: *mut T) -> Self;

    /// Whether the pointer is null
    #[inline]
    fn is_null(&self) -> bool {
        self.get().is_null()
    }
}
