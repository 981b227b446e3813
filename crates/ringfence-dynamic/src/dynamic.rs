//! Growable pool of fence-synchronized rings serving one allocation stream.
//!
//! [`FencedDynamicRingBuffer`] keeps rings in a map ordered by capacity.
//! A request walks three tiers:
//!
//! 1. **Fast path**: if the ring set can be read-locked without waiting,
//!    retry the ring that served the previous request.
//! 2. **Shared path**: read-lock and scan every ring smallest first.
//! 3. **Exclusive path**: write-lock, scan again (another thread may have
//!    grown the pool meanwhile), then create the smallest untried ring
//!    `initial * multiplier^k` that fits the request.
//!
//! Fence transitions take the write lock, so they never overlap an
//! allocation. Completing a fence retires non-primary rings that have
//! been empty for longer than the configured lifetime.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use smallvec::SmallVec;

use ringfence_core::{BufferResource, FenceValue, ResourceFactory};
use ringfence_ring::{FencedRingBuffer, ScopedAllocation};

use crate::config::DynamicRingConfig;
use crate::error::AllocError;

/// Sentinel for "no cached ring". Ring capacities are never zero.
const NO_RING: u64 = 0;

/// Everything guarded by the pool's lock.
struct RingSet<R: BufferResource> {
    /// Live rings keyed by capacity, smallest first.
    rings: BTreeMap<u64, FencedRingBuffer<R>>,
    current_fence: FenceValue,
    last_completed_fence: Option<FenceValue>,
    ring_lifetime: u64,
}

/// A pool of escalating-capacity rings that grows on demand and shrinks
/// when idle.
///
/// `allocate` may be called from any number of threads. The fence
/// setters are meant for a single driver thread but are safe to call
/// concurrently with allocation; they simply wait for in-flight
/// allocations to finish.
pub struct FencedDynamicRingBuffer<F: ResourceFactory> {
    factory: F,
    config: DynamicRingConfig,
    state: RwLock<RingSet<F::Resource>>,
    /// Capacity key of the ring that served the last request.
    last_ring: AtomicU64,
    /// Bytes in use across all rings. Exact after each completed fence.
    used: AtomicU64,
    /// Sum of live ring capacities.
    capacity: AtomicU64,
}

// Compile-time assertion: FencedDynamicRingBuffer must be Send + Sync.
#[allow(dead_code)]
fn assert_send_sync<F: ResourceFactory>() {
    fn assert<T: Send + Sync>() {}
    assert::<FencedDynamicRingBuffer<F>>();
}

impl<F: ResourceFactory> FencedDynamicRingBuffer<F> {
    /// Create a pool with a primary ring of `initial_capacity` bytes.
    ///
    /// Non-primary rings are retired once they have been empty for more
    /// than `ring_lifetime` fences (immediately when `0`).
    pub fn new(factory: F, initial_capacity: u64, ring_lifetime: u64) -> Result<Self, AllocError> {
        Self::with_config(
            factory,
            DynamicRingConfig::new(initial_capacity).with_ring_lifetime(ring_lifetime),
        )
    }

    /// Create a pool from a full configuration.
    ///
    /// Fails if the configuration is invalid or the factory cannot create
    /// the primary ring.
    pub fn with_config(factory: F, config: DynamicRingConfig) -> Result<Self, AllocError> {
        config.validate()?;

        let resource = factory.allocate(config.initial_capacity)?;
        let mut rings = BTreeMap::new();
        rings.insert(config.initial_capacity, FencedRingBuffer::new(resource));
        log::debug!(
            "dynamic ring pool created with a {}-byte primary ring",
            config.initial_capacity
        );

        Ok(Self {
            factory,
            capacity: AtomicU64::new(config.initial_capacity),
            state: RwLock::new(RingSet {
                rings,
                current_fence: FenceValue::ZERO,
                last_completed_fence: None,
                ring_lifetime: config.ring_lifetime,
            }),
            config,
            last_ring: AtomicU64::new(NO_RING),
            used: AtomicU64::new(0),
        })
    }

    /// Allocate `size` bytes aligned to `alignment`.
    ///
    /// Only fails when a new ring is needed and cannot be created.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero or `alignment` is not a power of two.
    pub fn allocate(
        &self,
        size: u64,
        alignment: u64,
    ) -> Result<ScopedAllocation<F::Resource>, AllocError> {
        assert!(size > 0, "cannot allocate zero bytes");
        assert!(
            alignment.is_power_of_two(),
            "alignment must be a power of two, got {alignment}"
        );

        let cached = self.last_ring.load(Ordering::Acquire);
        if cached != NO_RING {
            if let Ok(state) = self.state.try_read() {
                if let Some(ring) = state.rings.get(&cached) {
                    if let Some(allocation) = ring.try_allocate(size, alignment) {
                        self.used
                            .fetch_add(allocation.total_size(), Ordering::AcqRel);
                        return Ok(allocation);
                    }
                }
            }
        }

        {
            let state = self.read_state();
            if let Some(allocation) = self.allocate_from_existing(&state.rings, size, alignment) {
                return Ok(allocation);
            }
        }

        let mut state = self.write_state();
        if let Some(allocation) = self.allocate_from_existing(&state.rings, size, alignment) {
            return Ok(allocation);
        }

        let capacity = self.next_ring_capacity(&state.rings, size)?;
        let resource = self.factory.allocate(capacity)?;
        let mut ring = FencedRingBuffer::new(resource);
        ring.set_current_fence_value(state.current_fence);
        let allocation = ring
            .try_allocate(size, alignment)
            .expect("fresh ring of at least `size` bytes always fits");

        state.rings.insert(capacity, ring);
        self.capacity.fetch_add(capacity, Ordering::AcqRel);
        self.used.fetch_add(allocation.total_size(), Ordering::AcqRel);
        self.last_ring.store(capacity, Ordering::Release);
        log::debug!(
            "grew dynamic ring pool with a {capacity}-byte ring for a {size}-byte request ({} rings)",
            state.rings.len()
        );

        Ok(allocation)
    }

    /// Close every ring's allocation scope and make `fence` current.
    ///
    /// # Panics
    ///
    /// Panics if `fence` is lower than the current fence.
    pub fn set_current_fence_value(&self, fence: FenceValue) {
        let mut state = self.write_state();
        assert!(
            fence >= state.current_fence,
            "fence must not regress: current {}, new {fence}",
            state.current_fence
        );

        self.last_ring.store(NO_RING, Ordering::Release);
        state.current_fence = fence;
        for ring in state.rings.values_mut() {
            ring.set_current_fence_value(fence);
        }
        log::trace!("dynamic ring pool: current fence {fence}");
    }

    /// Reclaim everything stamped at or below `completed` and retire
    /// non-primary rings whose idle lifetime has expired.
    ///
    /// # Panics
    ///
    /// Panics if `completed` exceeds the current fence or is lower than
    /// the previously completed fence.
    pub fn set_last_completed_fence_value(&self, completed: FenceValue) {
        let mut state = self.write_state();
        assert!(
            completed <= state.current_fence,
            "completed fence {completed} exceeds current fence {}",
            state.current_fence
        );
        if let Some(previous) = state.last_completed_fence {
            assert!(
                completed >= previous,
                "completed fence must not regress: previous {previous}, new {completed}"
            );
        }

        state.last_completed_fence = Some(completed);
        self.reclaim_and_retire(&mut state, completed);
        log::trace!(
            "dynamic ring pool: completed fence {completed}, {} bytes in use",
            self.allocated_space()
        );
    }

    /// Change how many fences an empty non-primary ring survives, and
    /// immediately retire rings that no longer qualify.
    pub fn set_ring_lifetime_with_no_allocation(&self, lifetime: u64) {
        let mut state = self.write_state();
        state.ring_lifetime = lifetime;
        if let Some(completed) = state.last_completed_fence {
            self.reclaim_and_retire(&mut state, completed);
        }
    }

    /// Sum of live ring capacities in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity.load(Ordering::Acquire)
    }

    /// Bytes in use across all rings.
    pub fn allocated_space(&self) -> u64 {
        self.used.load(Ordering::Acquire)
    }

    /// Capacity not currently in use.
    pub fn free_space(&self) -> u64 {
        self.capacity().saturating_sub(self.allocated_space())
    }

    /// Current idle lifetime for non-primary rings, in fences.
    pub fn ring_lifetime(&self) -> u64 {
        self.read_state().ring_lifetime
    }

    /// Fence stamped on new allocations.
    pub fn current_fence(&self) -> FenceValue {
        self.read_state().current_fence
    }

    /// Most recent fence reported complete, if any.
    pub fn last_completed_fence(&self) -> Option<FenceValue> {
        self.read_state().last_completed_fence
    }

    /// Number of live rings, primary included.
    pub fn ring_count(&self) -> usize {
        self.read_state().rings.len()
    }

    /// Capacities of the live rings, smallest first.
    pub fn ring_capacities(&self) -> SmallVec<[u64; 8]> {
        self.read_state().rings.keys().copied().collect()
    }

    /// The configuration the pool was built with. `ring_lifetime` here is
    /// the initial value; see [`ring_lifetime`](Self::ring_lifetime).
    pub fn config(&self) -> &DynamicRingConfig {
        &self.config
    }

    /// The resource factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RingSet<F::Resource>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RingSet<F::Resource>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Try each ring with enough free space, smallest first.
    fn allocate_from_existing(
        &self,
        rings: &BTreeMap<u64, FencedRingBuffer<F::Resource>>,
        size: u64,
        alignment: u64,
    ) -> Option<ScopedAllocation<F::Resource>> {
        for (&capacity, ring) in rings {
            if ring.free_space() < size {
                continue;
            }
            if let Some(allocation) = ring.try_allocate(size, alignment) {
                self.used.fetch_add(allocation.total_size(), Ordering::AcqRel);
                self.last_ring.store(capacity, Ordering::Release);
                return Some(allocation);
            }
        }
        None
    }

    /// Smallest `initial * multiplier^k` (k >= 1) that fits `size` and has
    /// no live ring yet.
    fn next_ring_capacity(
        &self,
        rings: &BTreeMap<u64, FencedRingBuffer<F::Resource>>,
        size: u64,
    ) -> Result<u64, AllocError> {
        let limit = || {
            let largest = rings.keys().next_back().copied().unwrap_or(0);
            log::warn!(
                "dynamic ring pool cannot grow for a {size}-byte request: {} rings, largest {largest} bytes",
                rings.len()
            );
            AllocError::GrowthLimit {
                requested: size,
                rings: rings.len(),
                largest,
            }
        };

        if self.config.max_rings.is_some_and(|max| rings.len() >= max) {
            return Err(limit());
        }

        let mut k = 1;
        loop {
            let capacity = self.config.ring_capacity(k).ok_or_else(limit)?;
            if self
                .config
                .max_ring_capacity
                .is_some_and(|max| capacity > max)
            {
                return Err(limit());
            }
            if capacity >= size && !rings.contains_key(&capacity) {
                return Ok(capacity);
            }
            k += 1;
        }
    }

    fn reclaim_and_retire(&self, state: &mut RingSet<F::Resource>, completed: FenceValue) {
        self.last_ring.store(NO_RING, Ordering::Release);

        let primary = self.config.initial_capacity;
        let lifetime = state.ring_lifetime;
        let mut used = 0;
        let mut expired: SmallVec<[u64; 4]> = SmallVec::new();

        for (&capacity, ring) in state.rings.iter_mut() {
            ring.set_last_completed_fence_value(completed);
            let ring_used = ring.allocated_space();
            if ring_used == 0 && capacity != primary && idle_expired(ring, completed, lifetime) {
                expired.push(capacity);
            } else {
                used += ring_used;
            }
        }

        for capacity in expired {
            if let Some(ring) = state.rings.remove(&capacity) {
                self.release_ring(capacity, ring);
            }
        }

        self.used.store(used, Ordering::Release);
    }

    fn release_ring(&self, capacity: u64, ring: FencedRingBuffer<F::Resource>) {
        let fence = ring.current_fence();
        self.factory.release(ring.into_resource(), fence);
        self.capacity.fetch_sub(capacity, Ordering::AcqRel);
        log::debug!("retired {capacity}-byte ring at fence {fence}");
    }
}

/// Whether an empty ring has outlived `lifetime` fences since its last
/// allocation. Fence distance uses wrap-around subtraction.
fn idle_expired<R: BufferResource>(
    ring: &FencedRingBuffer<R>,
    completed: FenceValue,
    lifetime: u64,
) -> bool {
    if lifetime == 0 {
        return true;
    }
    match ring.last_allocation_fence() {
        None => true,
        Some(last) => completed.wrapping_distance(last) > lifetime,
    }
}

impl<F: ResourceFactory> Drop for FencedDynamicRingBuffer<F> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        let rings = std::mem::take(&mut state.rings);
        for (_, ring) in rings {
            let fence = ring.current_fence();
            self.factory.release(ring.into_resource(), fence);
        }
        self.capacity.store(0, Ordering::Release);
    }
}
