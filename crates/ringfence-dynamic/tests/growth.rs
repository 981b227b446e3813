//! Growth under bursts and shrink-back once the bursts stop.

use std::sync::Arc;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use ringfence_core::FenceValue;
use ringfence_dynamic::{DynamicRingConfig, FencedDynamicRingBuffer};
use ringfence_test_utils::RecordingFactory;

type Pool = FencedDynamicRingBuffer<Arc<RecordingFactory>>;

#[test]
fn bursts_grow_the_pool_and_idle_frames_shrink_it() {
    let factory = Arc::new(RecordingFactory::new());
    let config = DynamicRingConfig::new(4096)
        .with_growth_multiplier(4)
        .with_ring_lifetime(3);
    let pool = Pool::with_config(Arc::clone(&factory), config).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut fence = 0;
    let mut peak_rings = 1;

    // Ten frames of heavy traffic, each far larger than the primary ring.
    for _ in 0..10 {
        for _ in 0..64 {
            let size = 64 + rng.next_u64() % 1024;
            let _ = pool.allocate(size, 256).unwrap();
        }
        fence += 1;
        pool.set_current_fence_value(FenceValue(fence));
        pool.set_last_completed_fence_value(FenceValue(fence - 1));
        peak_rings = peak_rings.max(pool.ring_count());

        for capacity in pool.ring_capacities() {
            let mut c = capacity;
            while c > 4096 {
                assert_eq!(c % 4, 0);
                c /= 4;
            }
            assert_eq!(c, 4096, "{capacity} is not 4096 * 4^k");
        }
    }
    assert!(peak_rings > 1);

    // Light traffic fits the primary ring; extra rings age out.
    for _ in 0..6 {
        let _ = pool.allocate(128, 16).unwrap();
        fence += 1;
        pool.set_current_fence_value(FenceValue(fence));
        pool.set_last_completed_fence_value(FenceValue(fence - 1));
    }
    pool.set_last_completed_fence_value(FenceValue(fence));

    assert_eq!(pool.ring_capacities().as_slice(), &[4096]);
    assert_eq!(pool.capacity(), 4096);
    assert_eq!(factory.live(), 1);
    assert_eq!(factory.releases().len(), factory.allocations().len() - 1);
}

#[test]
fn lifetime_can_be_tuned_between_frames() {
    let factory = Arc::new(RecordingFactory::new());
    let pool = Pool::new(Arc::clone(&factory), 1024, u64::MAX).unwrap();

    let _ = pool.allocate(2000, 1).unwrap();
    for fence in 1..=20 {
        pool.set_current_fence_value(FenceValue(fence));
        pool.set_last_completed_fence_value(FenceValue(fence));
    }
    assert_eq!(pool.ring_count(), 2, "an effectively infinite lifetime keeps idle rings");

    pool.set_ring_lifetime_with_no_allocation(5);
    assert_eq!(pool.ring_count(), 1);
    assert_eq!(factory.releases()[0].capacity, 2048);
    assert_eq!(factory.releases()[0].last_fence, FenceValue(20));
}
