//! Capabilities the allocators consume from a graphics backend.
//!
//! The allocators never read or write buffer bytes. They only track
//! offset ranges inside a [`BufferResource`] and ask a
//! [`ResourceFactory`] to create or release whole resources.

use std::sync::Arc;

use crate::error::ResourceError;
use crate::fence::FenceValue;

/// A fixed-capacity buffer owned by a graphics backend.
///
/// Many allocation holders may write to disjoint ranges of the same
/// resource concurrently, so implementations must be `Send + Sync`.
pub trait BufferResource: Send + Sync {
    /// Access descriptor handed to allocation holders (CPU mapping
    /// and/or GPU address of a sub-range).
    type Entry;

    /// Total capacity of the resource in bytes.
    fn capacity(&self) -> u64;

    /// Describe the sub-range `[offset, offset + size)`.
    ///
    /// The descriptor stays valid until the range is reclaimed.
    fn entry(&self, offset: u64, size: u64) -> Self::Entry;

    /// Mark `[offset, offset + size)` as stale.
    ///
    /// Called immediately before the range is handed back to the
    /// allocator for reuse. The default does nothing.
    fn reset_region(&self, offset: u64, size: u64) {
        let _ = (offset, size);
    }
}

/// Creates and releases [`BufferResource`]s on behalf of a growable pool.
pub trait ResourceFactory: Send + Sync {
    /// The resource type this factory produces.
    type Resource: BufferResource;

    /// Create a resource of exactly `capacity` bytes.
    fn allocate(&self, capacity: u64) -> Result<Arc<Self::Resource>, ResourceError>;

    /// Give a resource back to the backend.
    ///
    /// `last_fence` is the most recent fence under which the resource may
    /// have been referenced; the backend must keep the memory alive until
    /// that fence completes.
    fn release(&self, resource: Arc<Self::Resource>, last_fence: FenceValue);
}

impl<F: ResourceFactory + ?Sized> ResourceFactory for Arc<F> {
    type Resource = F::Resource;

    fn allocate(&self, capacity: u64) -> Result<Arc<Self::Resource>, ResourceError> {
        (**self).allocate(capacity)
    }

    fn release(&self, resource: Arc<Self::Resource>, last_fence: FenceValue) {
        (**self).release(resource, last_fence);
    }
}

/// Stock access descriptor for a sub-range of a buffer resource.
///
/// Backends that need richer descriptors define their own
/// [`BufferResource::Entry`]; this one covers the common pair of a
/// persistently mapped CPU view and a GPU virtual address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferEntry {
    /// Byte offset of the range inside the resource.
    pub offset: u64,
    /// Length of the range in bytes.
    pub size: u64,
    /// Byte offset of the range inside the resource's CPU mapping, if
    /// the resource is mapped for writing.
    pub host_offset: Option<u64>,
    /// GPU virtual address of the first byte, if the backend exposes one.
    pub gpu_address: Option<u64>,
}

impl BufferEntry {
    /// Whether the CPU can write the range directly.
    pub fn is_host_visible(&self) -> bool {
        self.host_offset.is_some()
    }

    /// One past the last byte of the range.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}
