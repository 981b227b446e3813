//! Core types and traits for the ringfence allocators.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the ring and dynamic-ring crates: fence
//! values, the buffer-resource and resource-factory capabilities the
//! allocators consume, and the resource error type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod fence;
pub mod resource;

pub use error::ResourceError;
pub use fence::FenceValue;
pub use resource::{BufferEntry, BufferResource, ResourceFactory};
