//! Criterion micro-benchmarks for the dynamic ring pool.

use std::thread;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ringfence_bench::{frame_sizes, host_pool};
use ringfence_core::FenceValue;

/// Benchmark: steady-state frame that fits the primary ring (fast path).
fn bench_pool_steady_frame(c: &mut Criterion) {
    let sizes = frame_sizes(256, 1024, 3);
    let pool = host_pool(1 << 20, 4);
    let mut fence = 0u64;

    c.bench_function("pool_steady_frame_256", |b| {
        b.iter(|| {
            for &size in &sizes {
                let _a = black_box(pool.allocate(size, 256).unwrap());
            }
            fence += 1;
            pool.set_current_fence_value(FenceValue(fence));
            pool.set_last_completed_fence_value(FenceValue(fence.saturating_sub(2)));
        });
    });
}

/// Benchmark: burst that overflows the primary ring, then retirement.
fn bench_pool_grow_and_retire(c: &mut Criterion) {
    let sizes = frame_sizes(64, 4096, 4);
    let pool = host_pool(16 << 10, 0);
    let mut fence = 0u64;

    c.bench_function("pool_grow_and_retire", |b| {
        b.iter(|| {
            for &size in &sizes {
                let _a = black_box(pool.allocate(size, 16).unwrap());
            }
            fence += 1;
            pool.set_current_fence_value(FenceValue(fence));
            pool.set_last_completed_fence_value(FenceValue(fence));
            black_box(pool.ring_count());
        });
    });
}

/// Benchmark: 4 threads allocating 128 blocks each from one pool.
fn bench_pool_contended(c: &mut Criterion) {
    let pool = host_pool(4 << 20, 4);
    let mut fence = 0u64;

    c.bench_function("pool_contended_4x128", |b| {
        b.iter(|| {
            thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| {
                        for _ in 0..128 {
                            let _a = black_box(pool.allocate(256, 256).unwrap());
                        }
                    });
                }
            });
            fence += 1;
            pool.set_current_fence_value(FenceValue(fence));
            pool.set_last_completed_fence_value(FenceValue(fence));
        });
    });
}

criterion_group!(
    benches,
    bench_pool_steady_frame,
    bench_pool_grow_and_retire,
    bench_pool_contended
);
criterion_main!(benches);
