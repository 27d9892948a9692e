//! FWB Benchmarks
//!
//! Cost of barriered stores and bulk copies against plain ones.
//! Run with: `cargo bench --package fwb`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fwb::barrier::{register_card_table, unregister_card_table, CardTable, CardTableBarrier, NoBarrier};
use fwb::memory::copy_slice;
use fwb::policy::{LeafAllocator, ManagedAllocator};
use fwb::{PlainPtr, TrackedPtr};
use std::mem::size_of;
use std::sync::Arc;

fn bench_field_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_store");
    let mut target = 0u64;
    let target: *mut u64 = &mut target;

    group.bench_function("plain", |b| {
        let mut field: PlainPtr<u64> = PlainPtr::null();
        b.iter(|| field.set(black_box(target)))
    });

    group.bench_function("tracked_no_barrier", |b| {
        let mut field: TrackedPtr<u64, NoBarrier> = TrackedPtr::null();
        b.iter(|| field.set(black_box(target)))
    });

    group.bench_function("tracked_unrecorded", |b| {
        let mut field: TrackedPtr<u64, CardTableBarrier> = TrackedPtr::null();
        b.iter(|| field.set(black_box(target)))
    });

    group.bench_function("tracked_card_table", |b| {
        let mut fields: Vec<TrackedPtr<u64, CardTableBarrier>> =
            (0..64).map(|_| TrackedPtr::null()).collect();
        let base = fields.as_ptr() as usize & !511;
        let end = fields.as_ptr() as usize + fields.len() * size_of::<TrackedPtr<u64>>();
        let table = Arc::new(CardTable::new(base, end - base, 9).unwrap());
        register_card_table(table.clone());

        b.iter(|| fields[black_box(17)].set(black_box(target)));

        unregister_card_table(&table);
    });

    group.finish();
}

fn bench_bulk_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_copy");
    let mut target = 0u64;
    let target: *mut u64 = &mut target;

    for len in [8usize, 64, 512, 4096] {
        let src = vec![target; len];
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("tracked", len), &len, |b, &len| {
            let mut dst: Vec<TrackedPtr<u64, NoBarrier>> = (0..len).map(|_| TrackedPtr::null()).collect();
            b.iter(|| TrackedPtr::copy_from_raw_slice(&mut dst, black_box(&src)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("managed_policy", len), &len, |b, &len| {
            let mut dst = vec![std::ptr::null_mut::<u64>(); len];
            b.iter(|| copy_slice::<_, ManagedAllocator<NoBarrier>>(&mut dst, black_box(&src)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("leaf_policy", len), &len, |b, &len| {
            let mut dst = vec![std::ptr::null_mut::<u64>(); len];
            b.iter(|| copy_slice::<_, LeafAllocator<NoBarrier>>(&mut dst, black_box(&src)).unwrap())
        });
    }

    group.finish();
}

fn bench_card_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("card_scan");

    for cards in [64usize, 1024, 16384] {
        let table = CardTable::new(0x1000_0000, cards << 9, 9).unwrap();
        group.bench_with_input(BenchmarkId::new("drain_half_dirty", cards), &cards, |b, &cards| {
            b.iter(|| {
                for i in (0..cards).step_by(2) {
                    let _ = table.dirty_range(0x1000_0000 + (i << 9), 8);
                }
                black_box(table.drain_dirty(|_, _| {}))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_field_store, bench_bulk_copy, bench_card_scan);
criterion_main!(benches);
