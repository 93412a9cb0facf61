//! Criterion micro-benchmarks for buddy arena allocate and release paths.

use buddy_arena::Arena;
use buddy_bench::{churn, interleaved, request_sizes, ReleaseOrder};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// 64K `u32` slots: a 256KB arena.
fn make_arena_64k() -> Arena<u32> {
    Arena::new(1 << 16)
}

/// Benchmark: one small allocate + release on a pristine arena.
///
/// Exercises the full split chain down from the whole arena and the full
/// merge chain back up.
fn bench_alloc_release_pair(c: &mut Criterion) {
    let mut arena = make_arena_64k();
    c.bench_function("alloc_release_pair", |b| {
        b.iter(|| {
            let a = arena.allocate(black_box(3)).unwrap();
            arena.deallocate(a);
        });
    });
}

/// Benchmark: 256 mixed requests released LIFO.
fn bench_churn_lifo(c: &mut Criterion) {
    let mut arena = make_arena_64k();
    let sizes = request_sizes(256, 64, 42);
    c.bench_function("churn_lifo_256", |b| {
        b.iter(|| black_box(churn(&mut arena, &sizes, ReleaseOrder::Lifo)));
    });
}

/// Benchmark: 256 mixed requests released FIFO.
fn bench_churn_fifo(c: &mut Criterion) {
    let mut arena = make_arena_64k();
    let sizes = request_sizes(256, 64, 42);
    c.bench_function("churn_fifo_256", |b| {
        b.iter(|| black_box(churn(&mut arena, &sizes, ReleaseOrder::Fifo)));
    });
}

/// Benchmark: sliding window of 32 live allocations over 1K requests.
fn bench_interleaved(c: &mut Criterion) {
    let mut arena = make_arena_64k();
    let sizes = request_sizes(1024, 128, 7);
    c.bench_function("interleaved_window_32", |b| {
        b.iter(|| interleaved(&mut arena, &sizes, 32).unwrap());
    });
}

/// Benchmark: rejected request against a fragmented arena.
fn bench_exhaustion(c: &mut Criterion) {
    let mut arena = make_arena_64k();
    // 1000 * 4 + 16 -> 4096, served from 8KB blocks: half the arena held.
    let _held: Vec<_> = (0..16).map(|_| arena.allocate(1000).unwrap()).collect();
    c.bench_function("rejected_request", |b| {
        b.iter(|| black_box(arena.allocate(black_box(1 << 16)).is_err()));
    });
}

criterion_group!(
    benches,
    bench_alloc_release_pair,
    bench_churn_lifo,
    bench_churn_fifo,
    bench_interleaved,
    bench_exhaustion
);
criterion_main!(benches);
