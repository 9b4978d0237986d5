//! # Hash Table Benchmark
//!
//! Insert, lookup and remove/reinsert cycles on arena-backed tables.
//! Keys come from a seeded ChaCha stream so every run sees the same data.
//!
//! Run with: `cargo bench --package burrow_core --bench hash_table_benchmark`

#![allow(missing_docs)]

use burrow_core::{Arena, HashTable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SEED: u64 = 0x00B0_2204;

fn keys(count: usize) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    (0..count).map(|_| rng.gen()).collect()
}

/// Benchmark: inserting through several grow steps.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_table_insert");

    for count in [1_000, 10_000, 100_000] {
        let keys = keys(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &keys, |b, keys| {
            b.iter(|| {
                let arena = Arena::new(64 * 1024).unwrap();
                let mut table: HashTable<'_, u64, u64> = HashTable::new(&arena).unwrap();
                for &key in keys {
                    table.set(key, key ^ SEED).unwrap();
                }
                table.len()
            });
        });
    }

    group.finish();
}

/// Benchmark: hits and misses on a populated table.
fn bench_lookup(c: &mut Criterion) {
    let keys = keys(20_000);
    let (present, absent) = keys.split_at(10_000);

    let arena = Arena::new(64 * 1024).unwrap();
    let mut table: HashTable<'_, u64, u64> = HashTable::new(&arena).unwrap();
    for &key in present {
        table.set(key, key).unwrap();
    }

    c.bench_function("hash_table_get_hit_10k", |b| {
        b.iter(|| present.iter().filter_map(|key| table.get(black_box(key))).count());
    });
    c.bench_function("hash_table_get_miss_10k", |b| {
        b.iter(|| absent.iter().filter(|key| table.contains_key(black_box(key))).count());
    });
}

/// Benchmark: removing and reinserting, which recycles tombstoned slots.
fn bench_tombstone_churn(c: &mut Criterion) {
    let keys = keys(5_000);

    c.bench_function("hash_table_churn_5k", |b| {
        let arena = Arena::new(64 * 1024).unwrap();
        let mut table: HashTable<'_, u64, u64> = HashTable::new(&arena).unwrap();
        for &key in &keys {
            table.set(key, 0).unwrap();
        }

        b.iter(|| {
            for &key in &keys {
                table.remove(&key);
                table.set(key, 1).unwrap();
            }
            table.slot_count()
        });
    });
}

criterion_group!(benches, bench_insert, bench_lookup, bench_tombstone_churn);
criterion_main!(benches);
