//! Fence-synchronized ring buffer for transient GPU buffer memory.
//!
//! Hands out regions of one fixed-capacity buffer resource whose
//! contents the CPU must not overwrite until the GPU has consumed them.
//!
//! # Architecture
//!
//! ```text
//! FencedRingBuffer (one resource, Arc-shared with every allocation)
//! ├── head: LinearRange  (lock-free bump cursor)
//! ├── tail: LinearRange  (wrap-around window at the start of the buffer)
//! └── pending: VecDeque<scope>  (finalized scopes, FIFO by fence)
//! ```
//!
//! Allocation is lock-free through `&self`. Fence transitions take
//! `&mut self`; the borrow checker rules out a finalize or reclaim
//! overlapping an in-flight allocation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocation;
pub mod error;
pub mod linear;
pub mod ring;

pub use allocation::ScopedAllocation;
pub use error::IntegrityError;
pub use linear::{LinearAllocation, LinearRange};
pub use ring::FencedRingBuffer;
