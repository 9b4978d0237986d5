//! # Arena Allocation Benchmark
//!
//! Bump allocation throughput across page growth, huge regions and
//! string duplication.
//!
//! Run with: `cargo bench --package burrow_core --bench arena_benchmark`

#![allow(missing_docs)]

use burrow_core::{Arena, DynArray};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Benchmark: many small word-aligned allocations, with page chaining.
fn bench_small_allocations(c: &mut Criterion) {
    let mut group = c.benchmark_group("small_allocations");

    for capacity in [4 * 1024, 64 * 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let arena = Arena::new(capacity).unwrap();
                    for size in (0..10_000).map(|i| 8 + i % 56) {
                        black_box(arena.allocate_aligned(size).unwrap());
                    }
                    arena.region_count()
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: oversized requests spliced after the root.
fn bench_huge_allocations(c: &mut Criterion) {
    c.bench_function("huge_allocations_100", |b| {
        b.iter(|| {
            let arena = Arena::new(1024).unwrap();
            for _ in 0..100 {
                black_box(arena.allocate_aligned(black_box(8 * 1024)).unwrap());
            }
            arena.estimate_total_capacity()
        });
    });
}

/// Benchmark: copying request lines into the arena.
fn bench_duplicate_str(c: &mut Criterion) {
    let lines: Vec<String> = (0..1_000)
        .map(|i| format!("X-Request-Header-{i}: value-{}", i * 31))
        .collect();

    c.bench_function("duplicate_str_1k", |b| {
        b.iter(|| {
            let arena = Arena::new(16 * 1024).unwrap();
            for line in &lines {
                black_box(arena.duplicate_str(line).unwrap());
            }
            arena.used()
        });
    });
}

/// Benchmark: pushing into a doubling array.
fn bench_dyn_array_push(c: &mut Criterion) {
    c.bench_function("dyn_array_push_100k", |b| {
        b.iter(|| {
            let arena = Arena::new(64 * 1024).unwrap();
            let mut array: DynArray<'_, u64> = DynArray::new(&arena);
            for value in 0..100_000_u64 {
                array.push_back(value).unwrap();
            }
            black_box(array.len())
        });
    });
}

criterion_group!(
    benches,
    bench_small_allocations,
    bench_huge_allocations,
    bench_duplicate_str,
    bench_dyn_array_push
);
criterion_main!(benches);
