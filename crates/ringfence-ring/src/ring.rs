//! Fence-synchronized ring buffer over one fixed-capacity resource.
//!
//! [`FencedRingBuffer`] splits its resource into a head and a tail
//! [`LinearRange`]. Producers bump-allocate from head, then tail, through
//! `&self`. When the driver advances a fence, everything allocated since
//! the previous advance is folded into one or two queued scopes stamped
//! with the fence that was current while they were allocated. Once that
//! fence is reported complete, the scopes are popped from the front of
//! the queue and their space is fed back into whichever range they touch.
//!
//! ```text
//! HeadAtStart   H H H H . . . .     head.base == 0, tail empty after it
//! Contiguous    . . H H H T T .     head.base <= tail.base
//! Wrapped       T T . . H H H H     tail.base <= head.base, head ends at capacity
//! ```
//!
//! Fence operations take `&mut self`, so they can never run while an
//! allocation is in flight.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringfence_core::{BufferResource, FenceValue};

use crate::allocation::ScopedAllocation;
use crate::error::IntegrityError;
use crate::linear::LinearRange;

/// Sentinel stored in `last_allocation_fence` before the first allocation.
const NO_ALLOCATION: u64 = u64::MAX;

/// A finalized allocation scope waiting for its fence to complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingScope {
    offset: u64,
    /// Footprint in the ring, alignment padding and skipped space included.
    size: u64,
    fence: FenceValue,
}

/// Ring allocator over a single [`BufferResource`].
///
/// `try_allocate` may be called from any number of threads at once.
/// `set_current_fence_value` and `set_last_completed_fence_value` need
/// exclusive access and are driven by a single fence owner.
pub struct FencedRingBuffer<R: BufferResource> {
    resource: Arc<R>,
    capacity: u64,
    /// FIFO of finalized scopes, non-decreasing by fence.
    pending: VecDeque<PendingScope>,
    /// Bytes allocated since the last finalize.
    scope_size: AtomicU64,
    head: LinearRange,
    tail: LinearRange,
    /// In-scope plus queued bytes.
    used: AtomicU64,
    current_fence: FenceValue,
    last_completed_fence: FenceValue,
    last_allocation_fence: AtomicU64,
}

// Compile-time assertion: FencedRingBuffer must be Send + Sync.
#[allow(dead_code)]
fn assert_send_sync<R: BufferResource>() {
    fn assert<T: Send + Sync>() {}
    assert::<FencedRingBuffer<R>>();
}

impl<R: BufferResource> FencedRingBuffer<R> {
    /// Create a ring spanning the whole of `resource`.
    pub fn new(resource: Arc<R>) -> Self {
        let capacity = resource.capacity();
        Self {
            resource,
            capacity,
            pending: VecDeque::new(),
            scope_size: AtomicU64::new(0),
            head: LinearRange::new(0, capacity),
            tail: LinearRange::new(capacity, 0),
            used: AtomicU64::new(0),
            current_fence: FenceValue::ZERO,
            last_completed_fence: FenceValue::ZERO,
            last_allocation_fence: AtomicU64::new(NO_ALLOCATION),
        }
    }

    /// Allocate `size` bytes aligned to `alignment`.
    ///
    /// Tries the head range, then the tail range. Returns `None` without
    /// touching any state if neither has room. The allocation is stamped
    /// with the current fence.
    ///
    /// `size` must be non-zero and `alignment` a power of two; debug
    /// builds panic otherwise.
    pub fn try_allocate(&self, size: u64, alignment: u64) -> Option<ScopedAllocation<R>> {
        debug_assert!(size > 0, "cannot allocate zero bytes");
        debug_assert!(
            alignment.is_power_of_two(),
            "alignment must be a power of two, got {alignment}"
        );

        if size > self.free_space() {
            return None;
        }

        let placed = self
            .head
            .try_allocate(size, alignment)
            .or_else(|| self.tail.try_allocate(size, alignment))?;

        let total = size + placed.padding;
        self.used.fetch_add(total, Ordering::AcqRel);
        self.scope_size.fetch_add(total, Ordering::AcqRel);
        // Racing stores all write the same value.
        self.last_allocation_fence
            .store(self.current_fence.0, Ordering::Relaxed);

        Some(ScopedAllocation::new(
            Arc::clone(&self.resource),
            placed.data_offset,
            size,
            placed.padding,
            self.current_fence,
        ))
    }

    /// Close the current allocation scope and make `fence` current.
    ///
    /// # Panics
    ///
    /// Panics if `fence` is lower than the current fence.
    pub fn set_current_fence_value(&mut self, fence: FenceValue) {
        assert!(
            fence >= self.current_fence,
            "fence must not regress: current {}, new {fence}",
            self.current_fence
        );
        self.finalize_scope();
        self.current_fence = fence;
    }

    /// Close the current scope and reclaim every scope whose fence is at
    /// or below `completed`.
    ///
    /// # Panics
    ///
    /// Panics if `completed` exceeds the current fence or is lower than
    /// the previously completed fence.
    pub fn set_last_completed_fence_value(&mut self, completed: FenceValue) {
        assert!(
            completed <= self.current_fence,
            "completed fence {completed} exceeds current fence {}",
            self.current_fence
        );
        assert!(
            completed >= self.last_completed_fence,
            "completed fence must not regress: previous {}, new {completed}",
            self.last_completed_fence
        );
        self.finalize_scope();
        self.release_obsolete(completed);
        self.last_completed_fence = completed;
    }

    /// Capacity of the backing resource in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes still allocatable (head free + tail free).
    pub fn free_space(&self) -> u64 {
        self.head.approx_free() + self.tail.approx_free()
    }

    /// Bytes in use: allocated in the open scope or queued behind a fence.
    pub fn allocated_space(&self) -> u64 {
        self.used.load(Ordering::Acquire)
    }

    /// Fence stamped on new allocations.
    pub fn current_fence(&self) -> FenceValue {
        self.current_fence
    }

    /// Most recent fence reported complete.
    pub fn last_completed_fence(&self) -> FenceValue {
        self.last_completed_fence
    }

    /// Fence that was current at the most recent successful allocation,
    /// or `None` if nothing was ever allocated.
    pub fn last_allocation_fence(&self) -> Option<FenceValue> {
        match self.last_allocation_fence.load(Ordering::Relaxed) {
            NO_ALLOCATION => None,
            fence => Some(FenceValue(fence)),
        }
    }

    /// Number of finalized scopes waiting for their fence.
    pub fn pending_scopes(&self) -> usize {
        self.pending.len()
    }

    /// The backing resource.
    pub fn resource(&self) -> &Arc<R> {
        &self.resource
    }

    /// Consume the ring and hand back its resource.
    pub fn into_resource(self) -> Arc<R> {
        self.resource
    }

    /// Check the head/tail/queue bookkeeping.
    ///
    /// Exact only while no allocation is in flight. Debug builds run this
    /// after every finalize and reclaim.
    pub fn verify_integrity(&self) -> Result<(), IntegrityError> {
        let used = self.allocated_space();
        let queued: u64 = self.pending.iter().map(|s| s.size).sum();
        let expected = self.head.approx_used() + self.tail.approx_used() + queued;
        if used != expected {
            return Err(IntegrityError::UsedMismatch { used, expected });
        }

        let accounted = used + self.free_space();
        if accounted != self.capacity {
            return Err(IntegrityError::CapacityMismatch {
                accounted,
                capacity: self.capacity,
            });
        }

        let (head, tail) = (&self.head, &self.tail);
        if head.extent() > 0
            && tail.extent() > 0
            && head.base() < tail.end()
            && tail.base() < head.end()
        {
            return Err(IntegrityError::RangesOverlap {
                head: (head.base(), head.end()),
                tail: (tail.base(), tail.end()),
            });
        }

        if let Some(oldest) = self.pending.front() {
            let at_wrap = oldest.offset == 0
                && (tail.base() == self.capacity || tail.base() == 0);
            if !at_wrap && oldest.offset != tail.end() {
                return Err(IntegrityError::OldestScopeDetached {
                    offset: oldest.offset,
                    tail_end: tail.end(),
                });
            }
        }

        for scope in &self.pending {
            if scope.size == 0 {
                return Err(IntegrityError::EmptyScope {
                    offset: scope.offset,
                });
            }
        }

        for (earlier, later) in self.pending.iter().zip(self.pending.iter().skip(1)) {
            if later.fence < earlier.fence {
                return Err(IntegrityError::FenceOrder {
                    earlier: earlier.fence,
                    later: later.fence,
                });
            }
        }

        Ok(())
    }

    fn enqueue(&mut self, offset: u64, size: u64) {
        self.pending.push_back(PendingScope {
            offset,
            size,
            fence: self.current_fence,
        });
    }

    /// Fold everything allocated since the last call into queued scopes.
    fn finalize_scope(&mut self) {
        let scope = *self.scope_size.get_mut();
        if scope == 0 {
            return;
        }

        let head_used = self.head.approx_used();
        let tail_used = self.tail.approx_used();

        if self.head.base() == 0 {
            // H H H H . . . .
            debug_assert_eq!(self.tail.base(), self.head.extent(), "tail must follow head");
            debug_assert_eq!(self.tail.extent(), 0, "tail must be empty without wrap");
            debug_assert_eq!(scope, head_used, "scope must come from head only");

            self.enqueue(0, scope);
            let end = self.tail.end();
            self.head.reset(scope, end - scope);
            self.tail.reset(self.head.end(), 0);
        } else if self.head.base() <= self.tail.base() {
            // . . H H H T T .
            debug_assert_eq!(head_used + tail_used, scope, "scope must match head + tail");
            // Tail only gains extent at offset 0 or right behind head, both
            // of which put the ring in another state.
            debug_assert_eq!(tail_used, 0, "contiguous tail cannot hold allocations");
            debug_assert!(head_used > 0, "scope is non-empty but head is untouched");
            self.enqueue(self.head.base(), head_used);

            let base = self.head.base() + head_used;
            let end = self.tail.end();
            self.head.reset(base, end - base);
            self.tail.reset(self.head.end(), 0);
        } else {
            // T T . . H H H H
            debug_assert_eq!(self.head.end(), self.capacity, "wrapped head must reach the end");
            debug_assert_eq!(head_used + tail_used, scope, "scope must match head + tail");

            if tail_used == 0 && self.head.approx_free() > 0 {
                // Head still has room; the tail is untouched.
                self.enqueue(self.head.base(), scope);
                let base = self.head.base() + scope;
                let extent = self.head.extent() - scope;
                self.head.reset(base, extent);
            } else {
                // Tail was used or head is full: give up the rest of head and
                // continue from the tail.
                if self.head.extent() > 0 {
                    let skipped = self.head.extent() - head_used;
                    *self.used.get_mut() += skipped;
                    self.enqueue(self.head.base(), self.head.extent());
                }
                if tail_used > 0 {
                    self.enqueue(self.tail.base(), tail_used);
                }

                let base = self.tail.base() + tail_used;
                let extent = self.tail.extent() - tail_used;
                self.head.reset(base, extent);
                self.tail.reset(self.head.end(), 0);
            }
        }

        *self.scope_size.get_mut() = 0;
        self.debug_check_integrity();
    }

    /// Pop every queued scope whose fence is `<= completed` and feed its
    /// space back into the adjacent range.
    fn release_obsolete(&mut self, completed: FenceValue) {
        let mut released = 0usize;
        while let Some(&scope) = self.pending.front() {
            if scope.fence > completed {
                break;
            }
            self.pending.pop_front();
            self.resource.reset_region(scope.offset, scope.size);
            *self.used.get_mut() -= scope.size;
            released += 1;

            if self.tail.base() == self.capacity {
                debug_assert_eq!(self.tail.extent(), 0, "tail at the end must be empty");
                debug_assert_eq!(scope.offset, 0, "scope after the wrap must start at 0");
                self.tail.reset(scope.offset, scope.size);
            } else if self.tail.base() == self.head.end() {
                debug_assert_eq!(self.head.end(), scope.offset, "scope must follow head");
                debug_assert_eq!(self.tail.approx_used(), 0, "tail must be unused");
                self.head.grow(scope.size);
                self.tail.reset(self.head.end(), 0);
            } else {
                debug_assert_eq!(self.tail.end(), scope.offset, "scope must follow tail");
                self.tail.grow(scope.size);
            }

            self.debug_check_integrity();
        }

        if self.pending.is_empty() {
            debug_assert_eq!(*self.used.get_mut(), 0, "empty queue with bytes in use");
            // Nothing outstanding: restart at offset 0 for the largest
            // contiguous run.
            self.head.reset(0, self.capacity);
            self.tail.reset(self.capacity, 0);
        }

        if released > 0 {
            log::trace!(
                "ring({} bytes): reclaimed {released} scopes up to fence {completed}, {} bytes in use",
                self.capacity,
                self.allocated_space()
            );
        }
    }

    fn debug_check_integrity(&self) {
        if cfg!(debug_assertions) {
            if let Err(err) = self.verify_integrity() {
                panic!("ring corruption: {err}");
            }
        }
    }
}
