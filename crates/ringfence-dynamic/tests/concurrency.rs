//! Multi-threaded allocation through the dynamic pool.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::thread;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use ringfence_core::{BufferResource, FenceValue};
use ringfence_dynamic::FencedDynamicRingBuffer;
use ringfence_ring::ScopedAllocation;
use ringfence_test_utils::{any_overlap, HostBuffer, RecordingFactory};

type Pool = FencedDynamicRingBuffer<Arc<RecordingFactory>>;

const WORKERS: u64 = 4;
const PER_WORKER: usize = 16;
const LAG: u64 = 2;

fn overlapping(allocations: &[ScopedAllocation<HostBuffer>]) -> bool {
    let mut by_resource: HashMap<*const HostBuffer, Vec<(u64, u64)>> = HashMap::new();
    for a in allocations {
        by_resource
            .entry(Arc::as_ptr(a.resource()))
            .or_default()
            .push((a.offset(), a.size()));
    }
    by_resource.values().any(|ranges| any_overlap(ranges))
}

#[test]
fn in_flight_allocations_never_alias() {
    let factory = Arc::new(RecordingFactory::new());
    let pool = Pool::new(Arc::clone(&factory), 1024, 2).unwrap();
    let mut in_flight: BTreeMap<u64, Vec<ScopedAllocation<HostBuffer>>> = BTreeMap::new();

    for frame in 0..40u64 {
        let fence = FenceValue(frame);
        let frame_allocations: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..WORKERS)
                .map(|worker| {
                    let pool = &pool;
                    s.spawn(move || {
                        let mut rng = ChaCha8Rng::seed_from_u64(frame * WORKERS + worker);
                        (0..PER_WORKER)
                            .map(|_| {
                                let size = 1 + rng.next_u64() % 700;
                                pool.allocate(size, 16).unwrap()
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });
        assert!(frame_allocations.iter().all(|a| a.fence() == fence));
        assert!(frame_allocations.iter().all(|a| a.offset() % 16 == 0));
        in_flight.insert(frame, frame_allocations);

        let live: Vec<_> = in_flight.values().flatten().cloned().collect();
        assert!(!overlapping(&live), "frame {frame}: in-flight regions alias");

        pool.set_current_fence_value(fence.next());
        if let Some(completed) = frame.checked_sub(LAG) {
            pool.set_last_completed_fence_value(FenceValue(completed));
            in_flight.retain(|&f, _| f > completed);
        }
    }

    let last = FenceValue(40 + LAG + 1);
    pool.set_current_fence_value(last);
    pool.set_last_completed_fence_value(last);
    assert_eq!(pool.allocated_space(), 0);
    assert_eq!(pool.ring_count(), 1);
    assert_eq!(pool.capacity(), 1024);
    assert_eq!(factory.live(), 1);
}

#[test]
fn fence_driver_runs_alongside_allocators() {
    let factory = Arc::new(RecordingFactory::new());
    let pool = Pool::new(Arc::clone(&factory), 512, 1).unwrap();
    const FENCES: u64 = 200;

    let per_worker: Vec<Vec<ScopedAllocation<HostBuffer>>> = thread::scope(|s| {
        let workers: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let pool = &pool;
                s.spawn(move || {
                    let mut rng = ChaCha8Rng::seed_from_u64(0xfe_4ce + worker);
                    let mut kept = Vec::new();
                    for _ in 0..500 {
                        let size = 1 + rng.next_u64() % 300;
                        let allocation = pool.allocate(size, 8).unwrap();
                        let end = allocation.offset() + allocation.size();
                        assert!(end <= allocation.resource().capacity());
                        if rng.next_u64() % 8 == 0 {
                            kept.push(allocation);
                        }
                    }
                    kept
                })
            })
            .collect();

        let pool = &pool;
        s.spawn(move || {
            for fence in 1..=FENCES {
                pool.set_current_fence_value(FenceValue(fence));
                pool.set_last_completed_fence_value(FenceValue(fence - 1));
                thread::yield_now();
            }
        });

        workers.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Allocations stamped with the same fence in the same ring were
    // live at the same time and must be disjoint.
    let mut by_fence: BTreeMap<FenceValue, Vec<ScopedAllocation<HostBuffer>>> = BTreeMap::new();
    for allocation in per_worker.into_iter().flatten() {
        by_fence.entry(allocation.fence()).or_default().push(allocation);
    }
    for (fence, allocations) in &by_fence {
        assert!(!overlapping(allocations), "fence {fence}: regions alias");
    }

    let end = FenceValue(FENCES + 5);
    pool.set_current_fence_value(end);
    pool.set_last_completed_fence_value(end);
    assert_eq!(pool.allocated_space(), 0);
    assert_eq!(pool.ring_capacities().as_slice(), &[512]);
    assert_eq!(factory.live(), 1);
}
