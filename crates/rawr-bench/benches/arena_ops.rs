//! Criterion micro-benchmarks for bump allocation, in-place growth and reset.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rawr_arena::{Arena, ArenaConfig};
use rawr_bench::{arena_workload, run_arena_workload};

/// Benchmark: 1000 fixed-size bump allocations followed by a reset.
fn bench_arena_alloc_1k(c: &mut Criterion) {
    let mut arena = Arena::with_config(ArenaConfig::default()).unwrap();
    c.bench_function("arena_alloc_1k", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(arena.alloc_raw(black_box(48), 8).unwrap());
            }
            arena.reset();
        });
    });
}

/// Benchmark: grow the top allocation one byte at a time, always in place.
fn bench_arena_grow_in_place(c: &mut Criterion) {
    let mut arena = Arena::new(16 * 1024).unwrap();
    c.bench_function("arena_grow_in_place", |b| {
        b.iter(|| {
            {
                let mut bytes = arena.alloc_bytes(1, 1).unwrap();
                for size in 2..=4096 {
                    arena.grow_bytes(&mut bytes, size, 1).unwrap();
                }
                black_box(bytes.len());
            }
            arena.reset();
        });
    });
}

/// Benchmark: replay a seeded mixed workload on a 64 KiB arena.
fn bench_arena_mixed_workload(c: &mut Criterion) {
    let ops = arena_workload(42, 10_000);
    let mut arena = Arena::with_config(ArenaConfig::default()).unwrap();
    c.bench_function("arena_mixed_workload", |b| {
        b.iter(|| {
            let stats = run_arena_workload(&mut arena, black_box(&ops));
            arena.reset();
            black_box(stats);
        });
    });
}

criterion_group!(
    benches,
    bench_arena_alloc_1k,
    bench_arena_grow_in_place,
    bench_arena_mixed_workload
);
criterion_main!(benches);
