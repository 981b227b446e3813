//! Test utilities and mock resources for ringfence development.
//!
//! Provides a host-memory [`BufferResource`](ringfence_core::BufferResource)
//! that records reclamation calls ([`HostBuffer`]) and a
//! [`ResourceFactory`](ringfence_core::ResourceFactory) that counts live
//! resources and records releases ([`RecordingFactory`]).

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod factory;
pub mod host;

pub use factory::{RecordingFactory, Release};
pub use host::HostBuffer;

/// Returns true if any two `[offset, offset + size)` ranges overlap.
///
/// Zero-sized ranges never overlap anything.
pub fn any_overlap(ranges: &[(u64, u64)]) -> bool {
    let mut sorted: Vec<(u64, u64)> = ranges.iter().copied().filter(|&(_, s)| s > 0).collect();
    sorted.sort_unstable();
    sorted
        .windows(2)
        .any(|pair| pair[0].0 + pair[0].1 > pair[1].0)
}
