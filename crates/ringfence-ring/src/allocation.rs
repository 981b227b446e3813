//! Receipts for completed ring allocations.

use std::fmt;
use std::sync::Arc;

use ringfence_core::{BufferResource, FenceValue};

/// An immutable description of one allocation inside a buffer resource.
///
/// Holds an `Arc` to the resource, so the resource outlives the ring that
/// produced the allocation if the ring is retired first. The region stays
/// owned by the holder until the fence it was stamped with completes.
#[must_use]
pub struct ScopedAllocation<R: BufferResource> {
    resource: Arc<R>,
    offset: u64,
    size: u64,
    padding: u64,
    fence: FenceValue,
}

impl<R: BufferResource> ScopedAllocation<R> {
    pub(crate) fn new(
        resource: Arc<R>,
        offset: u64,
        size: u64,
        padding: u64,
        fence: FenceValue,
    ) -> Self {
        debug_assert!(offset + size <= resource.capacity());
        Self {
            resource,
            offset,
            size,
            padding,
            fence,
        }
    }

    /// Offset of the first usable byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Usable bytes starting at [`offset`](Self::offset).
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes skipped before `offset` to satisfy the requested alignment.
    pub fn alignment_padding(&self) -> u64 {
        self.padding
    }

    /// Footprint in the ring: `size + alignment_padding`.
    pub fn total_size(&self) -> u64 {
        self.size + self.padding
    }

    /// Fence that was current when the allocation was made.
    pub fn fence(&self) -> FenceValue {
        self.fence
    }

    /// The backing resource.
    pub fn resource(&self) -> &Arc<R> {
        &self.resource
    }

    /// Access descriptor for the allocated range, valid until reclamation.
    pub fn entry(&self) -> R::Entry {
        self.resource.entry(self.offset, self.size)
    }

    /// Mark the allocated range as stale in the backing resource.
    pub fn reset_allocation(&self) {
        self.resource.reset_region(self.offset, self.size);
    }
}

impl<R: BufferResource> Clone for ScopedAllocation<R> {
    fn clone(&self) -> Self {
        Self {
            resource: Arc::clone(&self.resource),
            offset: self.offset,
            size: self.size,
            padding: self.padding,
            fence: self.fence,
        }
    }
}

impl<R: BufferResource> fmt::Debug for ScopedAllocation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedAllocation")
            .field("offset", &self.offset)
            .field("size", &self.size)
            .field("padding", &self.padding)
            .field("fence", &self.fence)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringfence_test_utils::HostBuffer;

    #[test]
    fn accessors_report_construction_values() {
        let buf = Arc::new(HostBuffer::new(256));
        let alloc = ScopedAllocation::new(Arc::clone(&buf), 16, 100, 12, FenceValue(3));
        assert_eq!(alloc.offset(), 16);
        assert_eq!(alloc.size(), 100);
        assert_eq!(alloc.alignment_padding(), 12);
        assert_eq!(alloc.total_size(), 112);
        assert_eq!(alloc.fence(), FenceValue(3));
        assert!(Arc::ptr_eq(alloc.resource(), &buf));
    }

    #[test]
    fn entry_and_reset_delegate_to_the_resource() {
        let buf = Arc::new(HostBuffer::new(256));
        let alloc = ScopedAllocation::new(Arc::clone(&buf), 32, 8, 0, FenceValue::ZERO);
        let entry = alloc.entry();
        assert_eq!(entry.offset, 32);
        assert_eq!(entry.gpu_address, Some(buf.gpu_base() + 32));
        alloc.reset_allocation();
        assert_eq!(buf.resets(), vec![(32, 8)]);
    }

    #[test]
    fn allocation_keeps_the_resource_alive() {
        let buf = Arc::new(HostBuffer::new(64));
        let alloc = ScopedAllocation::new(Arc::clone(&buf), 0, 8, 0, FenceValue::ZERO);
        drop(buf);
        assert_eq!(alloc.resource().capacity(), 64);
        assert_eq!(Arc::strong_count(alloc.resource()), 1);
    }
}
