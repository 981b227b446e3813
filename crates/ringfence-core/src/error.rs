//! Errors reported by buffer-resource factories.

use std::error::Error;
use std::fmt;

/// Failure to create a buffer resource.
///
/// Returned by [`ResourceFactory::allocate`](crate::ResourceFactory::allocate)
/// and propagated unchanged through the allocators. No retry is attempted
/// internally; the caller decides whether to reduce quality or abort the
/// frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceError {
    /// The device or host could not provide the requested capacity.
    OutOfMemory {
        /// Capacity in bytes that was requested.
        requested: u64,
    },
    /// The backend refused the request for another reason.
    Rejected {
        /// Human-readable description from the backend.
        reason: String,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory allocating a {requested}-byte buffer")
            }
            Self::Rejected { reason } => {
                write!(f, "buffer allocation rejected: {reason}")
            }
        }
    }
}

impl Error for ResourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_requested_size() {
        let err = ResourceError::OutOfMemory { requested: 4096 };
        assert_eq!(err.to_string(), "out of memory allocating a 4096-byte buffer");
    }

    #[test]
    fn display_carries_backend_reason() {
        let err = ResourceError::Rejected {
            reason: "device lost".into(),
        };
        assert!(err.to_string().contains("device lost"));
    }
}
