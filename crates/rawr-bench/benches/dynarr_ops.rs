//! Criterion micro-benchmarks for growable array appends.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rawr_arena::Arena;
use rawr_bench::{append_batches, fill_dynarr};
use rawr_dynarr::{Dynarr, SystemAllocator};

/// Benchmark: push 10K elements onto a heap-backed array.
fn bench_dynarr_push_10k(c: &mut Criterion) {
    c.bench_function("dynarr_push_10k", |b| {
        b.iter(|| {
            let mut arr: Dynarr<u32> = Dynarr::new().unwrap();
            for i in 0..10_000u32 {
                arr.push(i).unwrap();
            }
            black_box(arr.len());
        });
    });
}

/// Benchmark: seeded batch appends through the heap allocator.
fn bench_dynarr_batches_heap(c: &mut Criterion) {
    let batches = append_batches(42, 2_000, 16);
    c.bench_function("dynarr_batches_heap", |b| {
        b.iter(|| black_box(fill_dynarr(SystemAllocator, black_box(&batches)).unwrap()));
    });
}

/// Benchmark: the same batches through an arena, growing in place.
fn bench_dynarr_batches_arena(c: &mut Criterion) {
    let batches = append_batches(42, 2_000, 16);
    let mut arena = Arena::new(4 * 1024 * 1024).unwrap();
    c.bench_function("dynarr_batches_arena", |b| {
        b.iter(|| {
            black_box(fill_dynarr(arena.allocator(), black_box(&batches)).unwrap());
            arena.reset();
        });
    });
}

criterion_group!(
    benches,
    bench_dynarr_push_10k,
    bench_dynarr_batches_heap,
    bench_dynarr_batches_arena
);
criterion_main!(benches);
