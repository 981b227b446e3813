//! Allocation errors for the dynamic ring pool.

use std::error::Error;
use std::fmt;

use ringfence_core::ResourceError;

use crate::config::ConfigError;

/// Errors from constructing or allocating through a
/// [`FencedDynamicRingBuffer`](crate::FencedDynamicRingBuffer).
///
/// Capacity exhaustion of an individual ring is never an error; the pool
/// falls back to a larger ring. These are the cases where it cannot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The pool configuration is invalid.
    Config(ConfigError),
    /// The resource factory failed to create a ring's buffer.
    Resource(ResourceError),
    /// A new ring is needed but the configured ring count or capacity
    /// limit (or `u64` range) has been reached.
    GrowthLimit {
        /// Size of the request that could not be placed.
        requested: u64,
        /// Rings alive when growth was refused.
        rings: usize,
        /// Capacity of the largest live ring.
        largest: u64,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Resource(e) => write!(f, "resource: {e}"),
            Self::GrowthLimit {
                requested,
                rings,
                largest,
            } => {
                write!(
                    f,
                    "cannot grow to fit {requested} bytes: {rings} rings alive, largest {largest} bytes"
                )
            }
        }
    }
}

impl Error for AllocError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Resource(e) => Some(e),
            Self::GrowthLimit { .. } => None,
        }
    }
}

impl From<ConfigError> for AllocError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ResourceError> for AllocError {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}
