//! Benchmark workloads and utilities for the ringfence allocators.
//!
//! - [`frame_sizes`]: deterministic per-frame request sizes
//! - [`host_ring`]: a fixed ring over host memory
//! - [`host_pool`]: a dynamic pool over a recording host factory

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use ringfence_dynamic::{DynamicRingConfig, FencedDynamicRingBuffer};
use ringfence_ring::FencedRingBuffer;
use ringfence_test_utils::{HostBuffer, RecordingFactory};

/// Generate `count` request sizes in `1..=max` from `seed`.
///
/// Uses a simple LCG so the same seed yields the same frame on every run.
pub fn frame_sizes(count: usize, max: u64, seed: u64) -> Vec<u64> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            1 + (state >> 33) % max
        })
        .collect()
}

/// A fixed ring of `capacity` bytes over a fresh [`HostBuffer`].
pub fn host_ring(capacity: u64) -> FencedRingBuffer<HostBuffer> {
    FencedRingBuffer::new(Arc::new(HostBuffer::new(capacity)))
}

/// A dynamic pool with a primary ring of `initial` bytes.
pub fn host_pool(initial: u64, ring_lifetime: u64) -> FencedDynamicRingBuffer<RecordingFactory> {
    let config = DynamicRingConfig::new(initial).with_ring_lifetime(ring_lifetime);
    FencedDynamicRingBuffer::with_config(RecordingFactory::new(), config)
        .expect("benchmark pool config is valid and host allocation cannot fail")
}
