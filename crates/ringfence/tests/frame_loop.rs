//! End-to-end frame loop through the facade.

use std::sync::Arc;

use ringfence::prelude::*;
use ringfence_test_utils::{HostBuffer, RecordingFactory};

#[test]
fn fixed_ring_recycles_frames() {
    let resource = Arc::new(HostBuffer::new(8192));
    let mut ring = FencedRingBuffer::new(Arc::clone(&resource));

    for frame in 0..32u64 {
        for _ in 0..3 {
            let a = ring.try_allocate(500, 256).expect("three frames in flight fit");
            assert!(a.entry().is_host_visible());
            assert_eq!(a.fence(), FenceValue(frame));
        }
        ring.set_current_fence_value(FenceValue(frame + 1));
        if frame >= 1 {
            ring.set_last_completed_fence_value(FenceValue(frame - 1));
        }
        assert!(ring.verify_integrity().is_ok());
    }

    ring.set_last_completed_fence_value(FenceValue(32));
    assert_eq!(ring.allocated_space(), 0);
    assert_eq!(ring.free_space(), 8192);
    assert!(!resource.resets().is_empty());
}

#[test]
fn dynamic_pool_through_prelude() {
    let factory = Arc::new(RecordingFactory::new());
    let config = DynamicRingConfig::new(1024).with_ring_lifetime(1);
    let pool = FencedDynamicRingBuffer::with_config(Arc::clone(&factory), config).unwrap();

    let a: ScopedAllocation<HostBuffer> = pool.allocate(3000, 16).unwrap();
    assert_eq!(a.resource().capacity(), 4096);
    drop(a);

    for fence in 1..=3 {
        pool.set_current_fence_value(FenceValue(fence));
        pool.set_last_completed_fence_value(FenceValue(fence));
    }
    assert_eq!(pool.ring_count(), 1);
    drop(pool);
    assert_eq!(factory.live(), 0);
}
