//! Plain Wrappers - Unbarriered Field Storage
//!
//! Transparent holders selected when a location never needs a barrier.
//! They exist so that a field declaration reads the same whichever policy
//! applies; assignment is an ordinary store and nothing is ever notified.

use crate::ptr::BarrierPtr;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr;

/// Pointer field with ordinary assignment
///
/// Unlike [`TrackedPtr`](crate::TrackedPtr) it is `Copy` and hands out its
/// mutable address.
#[repr(transparent)]
pub struct PlainPtr<T> {
    ptr: *mut T,
}

impl<T> PlainPtr<T> {
    #[inline]
    pub const fn new(ptr: *mut T) -> Self {
        Self { ptr }
    }

    #[inline]
    pub const fn null() -> Self {
        Self {
            ptr: ptr::null_mut(),
        }
    }

    #[inline(always)]
    pub fn get(&self) -> *mut T {
        self.ptr
    }

    #[inline(always)]
    pub fn set(&mut self, ptr: *mut T) {
        self.ptr = ptr;
    }

    #[inline(always)]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const *mut T {
        &self.ptr
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut *mut T {
        &mut self.ptr
    }

    /// # Safety
    ///
    /// The pointer must be null or point to a live `T` for the duration of
    /// the returned borrow.
    #[inline]
    pub unsafe fn as_ref(&self) -> Option<&T> {
        self.ptr.as_ref()
    }

    /// # Safety
    ///
    /// As [`PlainPtr::as_ref`], and no other reference to the pointee may
    /// exist while the returned borrow lives.
    #[inline]
    pub unsafe fn as_mut(&mut self) -> Option<&mut T> {
        self.ptr.as_mut()
    }
}

impl<T> Clone for PlainPtr<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PlainPtr<T> {}

impl<T> Default for PlainPtr<T> {
    #[inline]
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<*mut T> for PlainPtr<T> {
    #[inline]
    fn from(ptr: *mut T) -> Self {
        Self::new(ptr)
    }
}

impl<T> From<PlainPtr<T>> for *mut T {
    #[inline]
    fn from(ptr: PlainPtr<T>) -> Self {
        ptr.ptr
    }
}

impl<T> PartialEq for PlainPtr<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for PlainPtr<T> {}

impl<T> PartialEq<*mut T> for PlainPtr<T> {
    #[inline]
    fn eq(&self, other: &*mut T) -> bool {
        self.ptr == *other
    }
}

impl<T> fmt::Debug for PlainPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlainPtr({:p})", self.ptr)
    }
}

impl<T> BarrierPtr<T> for PlainPtr<T> {
    const TRACKED: bool = false;

    #[inline(always)]
    fn get(&self) -> *mut T {
        self.ptr
    }

    #[inline(always)]
    fn set(&mut self, ptr: *mut T) {
        self.ptr = ptr;
    }

    #[inline(always)]
    unsafe fn set_unbarriered(&mut self, ptr: *mut T) {
        self.ptr = ptr;
    }

    #[inline(always)]
    unsafe fn from_raw_unbarriered(ptr: *mut T) -> Self {
        Self::new(ptr)
    }
}

/// Non-pointer field with ordinary assignment
///
/// Dereferences to the value and compares and orders against both
/// `PlainField<T>` and bare `T`.
///
/// # Examples
///
/// ```rust
/// use fwb::PlainField;
///
/// let mut length = PlainField::new(10u32);
/// *length += 5;
/// assert!(length > 12u32);
/// assert_eq!(length.min_with(&12), 12);
/// assert_eq!(length.max_with(&12), 15);
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlainField<T> {
    value: T,
}

impl<T> PlainField<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.value
    }

    #[inline]
    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        &self.value
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        &mut self.value
    }

    /// Smaller of the field and `other`, as a bare value
    #[inline]
    pub fn min_with(&self, other: &T) -> T
    where
        T: PartialOrd + Clone,
    {
        if *other < self.value {
            other.clone()
        } else {
            self.value.clone()
        }
    }

    /// Larger of the field and `other`, as a bare value
    #[inline]
    pub fn max_with(&self, other: &T) -> T
    where
        T: PartialOrd + Clone,
    {
        if *other > self.value {
            other.clone()
        } else {
            self.value.clone()
        }
    }
}

impl<T> From<T> for PlainField<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> Deref for PlainField<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for PlainField<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: PartialEq> PartialEq<T> for PlainField<T> {
    #[inline]
    fn eq(&self, other: &T) -> bool {
        self.value == *other
    }
}

impl<T: PartialOrd> PartialOrd<T> for PlainField<T> {
    #[inline]
    fn partial_cmp(&self, other: &T) -> Option<Ordering> {
        self.value.partial_cmp(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ptr_roundtrip() {
        let mut value = 3i64;
        let raw: *mut i64 = &mut value;
        let mut field = PlainPtr::from(raw);
        assert_eq!(field, raw);
        assert_eq!(unsafe { field.as_ref() }, Some(&3));

        let back: *mut i64 = field.into();
        assert_eq!(back, raw);

        unsafe { *field.as_mut_ptr() = ptr::null_mut() };
        assert!(field.is_null());
    }

    #[test]
    fn test_plain_ptr_is_copy() {
        let mut value = 1u8;
        let a = PlainPtr::new(&mut value as *mut u8);
        let b = a;
        assert_eq!(a, b);
        assert!(!<PlainPtr<u8> as BarrierPtr<u8>>::TRACKED);
    }

    #[test]
    fn test_plain_field_ordering() {
        let a = PlainField::new(4i32);
        let b = PlainField::new(9i32);
        assert!(a < b);
        assert!(a < 5i32);
        assert!(b > 5i32);
        assert_eq!(a, 4i32);
        assert_eq!(std::cmp::min(a, b), a);
        assert_eq!(std::cmp::max(a, b).into_inner(), 9);
        assert_eq!(b.min_with(&7), 7);
        assert_eq!(a.max_with(&7), 7);
        assert_eq!(a.min_with(&4), 4);
    }

    #[test]
    fn test_plain_field_access() {
        let mut field = PlainField::from(7u16);
        field.set(8);
        *field += 1;
        assert_eq!(*field, 9);
        unsafe { *field.as_mut_ptr() = 11 };
        assert_eq!(unsafe { *field.as_ptr() }, 11);
    }
}
