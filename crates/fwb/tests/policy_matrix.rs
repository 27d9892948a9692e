//! Policy Resolution Tests
//!
//! Full matrix of allocator tags against element shapes, plus the wrapper
//! types the policy selects. Everything here resolves at compile time; the
//! assertions check the resolved constants and type identities.

use fwb::barrier::NoBarrier;
use fwb::opaque_element;
use fwb::policy::{
    allocator_requires, classify, requires_barrier, AllocatorIdentity, ArrayItem, FieldPtr,
    HeapAllocator, LeafAllocator, ManagedAllocator, NonLeafAllocator, ShapeClass,
};
use fwb::{PlainField, PlainPtr, TrackedPtr, WriteBarrierPolicy};
use std::any::TypeId;

struct Node;

#[derive(Clone, Copy)]
struct Span {
    _start: u32,
    _end: u32,
}

opaque_element!(Span);

/// Allocator declaring a tag instead of being one
struct StringAllocator;

impl AllocatorIdentity for StringAllocator {
    type Tag = LeafAllocator<NoBarrier>;
}

struct ObjectAllocator;

impl AllocatorIdentity for ObjectAllocator {
    type Tag = NonLeafAllocator<NoBarrier>;
}

type Managed = ManagedAllocator<NoBarrier>;
type NonLeaf = NonLeafAllocator<NoBarrier>;
type Leaf = LeafAllocator<NoBarrier>;
type Tracked = TrackedPtr<Node, NoBarrier>;

fn same<A: 'static, B: 'static>() -> bool {
    TypeId::of::<A>() == TypeId::of::<B>()
}

macro_rules! row {
    ($alloc:ty => $($elem:ty: $want:expr),* $(,)?) => {
        $(
            assert_eq!(
                requires_barrier::<$alloc, $elem>(),
                $want,
                "{} / {}",
                stringify!($alloc),
                stringify!($elem)
            );
        )*
    };
}

#[test]
fn test_heap_allocator_never_tracks() {
    row!(HeapAllocator =>
        u8: false, u64: false, f64: false, i32: false,
        *mut Node: false, *const Node: false, Tracked: false,
        PlainPtr<Node>: false, PlainField<u64>: false, Span: false,
        WriteBarrierPolicy: false,
    );
}

#[test]
fn test_managed_allocator_tracks_pointer_shapes() {
    row!(Managed =>
        u8: false, u64: false, f64: false, i32: false,
        *mut Node: true, *const Node: true, Tracked: true,
        PlainPtr<Node>: false, PlainField<u64>: false, Span: false,
        WriteBarrierPolicy: true,
    );
}

#[test]
fn test_non_leaf_allocator_tracks_all_but_i32() {
    row!(NonLeaf =>
        u8: true, u64: true, f64: true, i32: false,
        i64: true, u32: true, i16: true,
        *mut Node: true, *const Node: true, Tracked: true,
        PlainPtr<Node>: true, PlainField<u64>: true, Span: true,
        WriteBarrierPolicy: true,
    );
}

#[test]
fn test_leaf_allocator_never_tracks() {
    row!(Leaf =>
        u8: false, u64: false, f64: false, i32: false,
        *mut Node: false, *const Node: false, Tracked: false,
        PlainPtr<Node>: false, PlainField<u64>: false, Span: false,
        WriteBarrierPolicy: false,
    );
}

#[test]
fn test_declared_identities() {
    assert!(!allocator_requires::<StringAllocator>());
    assert!(allocator_requires::<ObjectAllocator>());
    assert!(!requires_barrier::<StringAllocator, *mut Node>());
    assert!(requires_barrier::<ObjectAllocator, u64>());
    assert!(!requires_barrier::<ObjectAllocator, i32>());
}

#[test]
fn test_user_types_classify() {
    assert_eq!(classify::<Span>(), ShapeClass::Opaque);
    assert_eq!(classify::<*mut Span>(), ShapeClass::PointerShaped);
}

#[test]
fn test_field_wrappers() {
    assert!(same::<FieldPtr<Node, Managed>, TrackedPtr<Node, NoBarrier>>());
    assert!(same::<FieldPtr<Node, ObjectAllocator>, TrackedPtr<Node, NoBarrier>>());
    assert!(same::<FieldPtr<Node, StringAllocator>, PlainPtr<Node>>());
    assert!(same::<FieldPtr<Span, HeapAllocator>, PlainPtr<Span>>());
}

#[test]
fn test_array_items() {
    assert!(same::<ArrayItem<*mut Node, Managed>, Tracked>());
    assert!(same::<ArrayItem<*const Node, Managed>, Tracked>());
    assert!(same::<ArrayItem<Tracked, Managed>, Tracked>());
    assert!(same::<ArrayItem<*mut Node, Leaf>, *mut Node>());
    assert!(same::<ArrayItem<Span, NonLeaf>, Span>());
    assert!(same::<ArrayItem<i32, NonLeaf>, i32>());
    assert!(same::<ArrayItem<u64, Managed>, u64>());
}

#[test]
fn test_default_manager_follows_feature() {
    use fwb::barrier::{CardTableBarrier, DefaultBarrier};

    if fwb::barrier::ENABLED {
        assert!(same::<DefaultBarrier, CardTableBarrier>());
    } else {
        assert!(same::<DefaultBarrier, NoBarrier>());
    }
    assert!(same::<FieldPtr<Node, ManagedAllocator>, TrackedPtr<Node, DefaultBarrier>>());
}
