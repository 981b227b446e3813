//! Resource factory that records what the allocator asks of it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ringfence_core::{BufferResource, FenceValue, ResourceError, ResourceFactory};

use crate::host::HostBuffer;

/// One call to [`ResourceFactory::release`] as seen by [`RecordingFactory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Release {
    pub capacity: u64,
    pub last_fence: FenceValue,
}

/// A [`ResourceFactory`] producing [`HostBuffer`]s.
///
/// Tracks the number of live resources, every requested capacity and
/// every release. Can be told to fail once a number of allocations has
/// succeeded, to exercise resource-creation failure paths.
pub struct RecordingFactory {
    live: AtomicUsize,
    allocations: Mutex<Vec<u64>>,
    releases: Mutex<Vec<Release>>,
    fail_after: Option<usize>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self {
            live: AtomicUsize::new(0),
            allocations: Mutex::new(Vec::new()),
            releases: Mutex::new(Vec::new()),
            fail_after: None,
        }
    }

    /// A factory whose allocations fail once `n` have succeeded.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::new()
        }
    }

    /// Resources handed out and not yet released.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Capacities requested so far, in call order.
    pub fn allocations(&self) -> Vec<u64> {
        self.allocations.lock().unwrap().clone()
    }

    /// Releases received so far, in call order.
    pub fn releases(&self) -> Vec<Release> {
        self.releases.lock().unwrap().clone()
    }
}

impl Default for RecordingFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceFactory for RecordingFactory {
    type Resource = HostBuffer;

    fn allocate(&self, capacity: u64) -> Result<Arc<HostBuffer>, ResourceError> {
        let mut allocations = self.allocations.lock().unwrap();
        if self.fail_after.is_some_and(|n| allocations.len() >= n) {
            return Err(ResourceError::OutOfMemory {
                requested: capacity,
            });
        }
        allocations.push(capacity);
        self.live.fetch_add(1, Ordering::AcqRel);
        Ok(Arc::new(HostBuffer::new(capacity)))
    }

    fn release(&self, resource: Arc<HostBuffer>, last_fence: FenceValue) {
        self.releases.lock().unwrap().push(Release {
            capacity: resource.capacity(),
            last_fence,
        });
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}
