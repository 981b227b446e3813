//! Dynamic pool of fence-synchronized rings.
//!
//! [`FencedDynamicRingBuffer`] serves an allocation stream of unknown
//! peak size. It starts with one primary ring and adds rings of
//! geometrically increasing capacity when a request does not fit, then
//! releases those extra rings through the [`ResourceFactory`] once they
//! have been idle for a configurable number of fences.
//!
//! [`ResourceFactory`]: ringfence_core::ResourceFactory

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dynamic;
pub mod error;

pub use config::{ConfigError, DynamicRingConfig};
pub use dynamic::FencedDynamicRingBuffer;
pub use error::AllocError;
