//! Host-memory buffer resource for tests and benchmarks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use ringfence_core::{BufferEntry, BufferResource};

/// Counter for unique fake GPU base addresses.
static NEXT_GPU_BASE: AtomicU64 = AtomicU64::new(0x1_0000_0000);

/// A [`BufferResource`] that pretends to be a persistently mapped GPU
/// buffer.
///
/// No memory is actually reserved. Every instance gets a distinct fake
/// GPU base address so tests can tell resources apart, and every
/// [`reset_region`](BufferResource::reset_region) call is recorded for
/// inspection.
pub struct HostBuffer {
    capacity: u64,
    gpu_base: u64,
    resets: Mutex<Vec<(u64, u64)>>,
}

impl HostBuffer {
    pub fn new(capacity: u64) -> Self {
        // Leave a 1 MiB gap between fake bases so ranges never alias.
        let stride = capacity.max(1).next_multiple_of(1 << 20);
        Self {
            capacity,
            gpu_base: NEXT_GPU_BASE.fetch_add(stride, Ordering::Relaxed),
            resets: Mutex::new(Vec::new()),
        }
    }

    /// Fake GPU address of byte 0.
    pub fn gpu_base(&self) -> u64 {
        self.gpu_base
    }

    /// All `(offset, size)` pairs passed to `reset_region`, in call order.
    pub fn resets(&self) -> Vec<(u64, u64)> {
        self.resets.lock().unwrap().clone()
    }

    /// Total bytes passed to `reset_region` so far.
    pub fn reset_bytes(&self) -> u64 {
        self.resets.lock().unwrap().iter().map(|&(_, s)| s).sum()
    }
}

impl BufferResource for HostBuffer {
    type Entry = BufferEntry;

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn entry(&self, offset: u64, size: u64) -> BufferEntry {
        assert!(
            offset + size <= self.capacity,
            "entry [{offset}, {}) outside {}-byte buffer",
            offset + size,
            self.capacity
        );
        BufferEntry {
            offset,
            size,
            host_offset: Some(offset),
            gpu_address: Some(self.gpu_base + offset),
        }
    }

    fn reset_region(&self, offset: u64, size: u64) {
        self.resets.lock().unwrap().push((offset, size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_host_visible_with_offset_addresses() {
        let buf = HostBuffer::new(256);
        let entry = buf.entry(64, 32);
        assert_eq!(entry.host_offset, Some(64));
        assert_eq!(entry.gpu_address, Some(buf.gpu_base() + 64));
    }

    #[test]
    fn distinct_buffers_get_distinct_bases() {
        let a = HostBuffer::new(256);
        let b = HostBuffer::new(256);
        assert_ne!(a.gpu_base(), b.gpu_base());
    }

    #[test]
    fn resets_are_recorded_in_order() {
        let buf = HostBuffer::new(256);
        buf.reset_region(0, 16);
        buf.reset_region(16, 32);
        assert_eq!(buf.resets(), vec![(0, 16), (16, 32)]);
        assert_eq!(buf.reset_bytes(), 48);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn entry_past_capacity_panics() {
        HostBuffer::new(16).entry(8, 16);
    }
}
