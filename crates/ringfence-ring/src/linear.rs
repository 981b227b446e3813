//! Lock-free bump allocation over one contiguous window of a buffer.
//!
//! A [`LinearRange`] covers `[base, base + extent)` and hands out aligned
//! sub-ranges by advancing an atomic cursor with compare-and-swap. Any
//! number of threads may allocate through `&self` concurrently; every
//! winner of the CAS owns a disjoint sub-range. Moving or resizing the
//! window requires `&mut self`, so it can never overlap an allocation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Result of a successful [`LinearRange::try_allocate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearAllocation {
    /// Aligned offset of the allocated data.
    pub data_offset: u64,
    /// Bytes skipped before `data_offset` to satisfy the alignment.
    pub padding: u64,
}

/// A window of a buffer with an atomic bump cursor.
///
/// Invariant: `base <= cursor <= base + extent`. The cursor only moves
/// forward until the next [`reset`](LinearRange::reset).
#[derive(Debug)]
pub struct LinearRange {
    base: u64,
    extent: u64,
    cursor: AtomicU64,
}

/// Round `value` up to the next multiple of `alignment` (a power of two).
#[inline]
pub fn align_up(value: u64, alignment: u64) -> u64 {
    (value + (alignment - 1)) & !(alignment - 1)
}

impl LinearRange {
    /// Create a range covering `[base, base + extent)` with nothing allocated.
    pub fn new(base: u64, extent: u64) -> Self {
        Self {
            base,
            extent,
            cursor: AtomicU64::new(base),
        }
    }

    /// Bump-allocate `size` bytes aligned to `alignment`.
    ///
    /// Returns `None` if the aligned request does not fit in what is left
    /// of the window. Safe to call from many threads at once.
    ///
    /// `size` must be non-zero and `alignment` a power of two; debug
    /// builds panic otherwise.
    pub fn try_allocate(&self, size: u64, alignment: u64) -> Option<LinearAllocation> {
        debug_assert!(size > 0, "cannot allocate zero bytes");
        debug_assert!(
            alignment.is_power_of_two(),
            "alignment must be a power of two, got {alignment}"
        );

        if size > self.approx_free() {
            return None;
        }

        let end = self.end();
        let mut current = self.cursor.load(Ordering::Acquire);
        loop {
            // Losing the race just means recomputing against the new cursor;
            // the loop ends once the window is exhausted.
            let aligned = align_up(current, alignment);
            let new_cursor = aligned.checked_add(size)?;
            if new_cursor > end {
                return None;
            }
            match self.cursor.compare_exchange_weak(
                current,
                new_cursor,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(LinearAllocation {
                        data_offset: aligned,
                        padding: aligned - current,
                    })
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Move the window to `[base, base + extent)` and forget all allocations.
    pub fn reset(&mut self, base: u64, extent: u64) {
        self.base = base;
        self.extent = extent;
        *self.cursor.get_mut() = base;
    }

    /// Extend the window by `by` bytes at its end.
    pub fn grow(&mut self, by: u64) {
        self.extent += by;
    }

    /// Start of the window.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Length of the window.
    pub fn extent(&self) -> u64 {
        self.extent
    }

    /// One past the last byte of the window.
    pub fn end(&self) -> u64 {
        self.base + self.extent
    }

    /// Bytes consumed so far, padding included.
    ///
    /// A snapshot: exact only while no allocation is in flight.
    pub fn approx_used(&self) -> u64 {
        self.cursor.load(Ordering::Acquire) - self.base
    }

    /// Bytes still available at the end of the window.
    ///
    /// A snapshot: exact only while no allocation is in flight.
    pub fn approx_free(&self) -> u64 {
        self.extent - self.approx_used()
    }
}
