//! Ringfence: fence-synchronized ring-buffer allocators for transient GPU
//! buffer memory.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all ringfence sub-crates. For most users, adding `ringfence` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use ringfence::prelude::*;
//!
//! // A backend resource: here just a capacity with no real memory behind it.
//! struct Upload(u64);
//! impl BufferResource for Upload {
//!     type Entry = BufferEntry;
//!     fn capacity(&self) -> u64 { self.0 }
//!     fn entry(&self, offset: u64, size: u64) -> BufferEntry {
//!         BufferEntry { offset, size, host_offset: Some(offset), gpu_address: None }
//!     }
//! }
//!
//! struct Backend;
//! impl ResourceFactory for Backend {
//!     type Resource = Upload;
//!     fn allocate(&self, capacity: u64) -> Result<Arc<Upload>, ResourceError> {
//!         Ok(Arc::new(Upload(capacity)))
//!     }
//!     fn release(&self, _resource: Arc<Upload>, _last_fence: FenceValue) {}
//! }
//!
//! // A pool starting with a 1 KiB ring; idle extra rings live for 2 fences.
//! let pool = FencedDynamicRingBuffer::new(Backend, 1024, 2).unwrap();
//!
//! // Frame 0: write constants, then submit.
//! let constants = pool.allocate(256, 256).unwrap();
//! assert_eq!(constants.entry().size, 256);
//! let big = pool.allocate(1500, 16).unwrap();
//! assert_eq!(big.resource().capacity(), 2048);
//! pool.set_current_fence_value(FenceValue(1));
//!
//! // The GPU reports frame 0 done: its memory is reusable.
//! pool.set_last_completed_fence_value(FenceValue(0));
//! assert_eq!(pool.allocated_space(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ringfence-core` | Fence values, resource traits, `ResourceError` |
//! | [`ring`] | `ringfence-ring` | `LinearRange`, `ScopedAllocation`, `FencedRingBuffer` |
//! | [`dynamic`] | `ringfence-dynamic` | `FencedDynamicRingBuffer` and its configuration |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Fence values and resource capabilities (`ringfence-core`).
pub use ringfence_core as types;

/// Single-resource ring allocator (`ringfence-ring`).
///
/// [`ring::FencedRingBuffer`] serves allocations from one fixed
/// resource; [`ring::LinearRange`] is its lock-free bump primitive.
pub use ringfence_ring as ring;

/// Growable pool of rings (`ringfence-dynamic`).
///
/// [`dynamic::FencedDynamicRingBuffer`] adds rings on demand and retires
/// idle ones, configured through [`dynamic::DynamicRingConfig`].
pub use ringfence_dynamic as dynamic;

/// Common imports for typical ringfence usage.
///
/// ```rust
/// use ringfence::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use ringfence_core::{
        BufferEntry, BufferResource, FenceValue, ResourceError, ResourceFactory,
    };

    // Allocators
    pub use ringfence_dynamic::{DynamicRingConfig, FencedDynamicRingBuffer};
    pub use ringfence_ring::{FencedRingBuffer, ScopedAllocation};

    // Errors
    pub use ringfence_dynamic::{AllocError, ConfigError};
}
