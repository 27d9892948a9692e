//! Constructor Barrier
//!
//! Objects are usually filled in with unbarriered stores while nothing else
//! can see them. If the object is published while a concurrent mark is
//! running, the mark may already have scanned the memory it lives in, so
//! the fields written during construction have to be reported once the
//! object is complete. [`ConstructorBarrier`] does that with one
//! notification over the whole object when the guard is dropped.

use super::{notify, DefaultBarrier, WriteBarrierManager};
use std::marker::PhantomData;
use std::mem::size_of;
use std::ops::{Deref, DerefMut};

/// Guard over an object under construction
///
/// # Examples
///
/// ```rust
/// use fwb::barrier::{ConstructorBarrier, NoBarrier};
/// use fwb::TrackedPtr;
///
/// struct Node {
///     next: TrackedPtr<Node, NoBarrier>,
///     value: u64,
/// }
///
/// let mut other = Node { next: TrackedPtr::null(), value: 1 };
/// let mut node = Node { next: TrackedPtr::null(), value: 0 };
/// {
///     let mut init = ConstructorBarrier::<_, NoBarrier>::new(&mut node);
///     // Covered by the notification issued when `init` drops
///     unsafe { init.next.set_unbarriered(&mut other) };
///     init.value = 2;
/// }
/// assert_eq!(node.value, 2);
/// ```
pub struct ConstructorBarrier<'a, T, M: WriteBarrierManager = DefaultBarrier> {
    object: &'a mut T,
    _manager: PhantomData<M>,
}

impl<'a, T, M: WriteBarrierManager> ConstructorBarrier<'a, T, M> {
    #[inline]
    pub fn new(object: &'a mut T) -> Self {
        Self {
            object,
            _manager: PhantomData,
        }
    }

    /// Address of the object being constructed
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        &*self.object
    }
}

impl<T, M: WriteBarrierManager> Deref for ConstructorBarrier<'_, T, M> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.object
    }
}

impl<T, M: WriteBarrierManager> DerefMut for ConstructorBarrier<'_, T, M> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.object
    }
}

impl<T, M: WriteBarrierManager> Drop for ConstructorBarrier<'_, T, M> {
    fn drop(&mut self) {
        notify::<M>(self.as_ptr().cast(), size_of::<T>());
    }
}
