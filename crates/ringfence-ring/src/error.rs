//! Ring bookkeeping diagnostics.

use std::error::Error;
use std::fmt;

use ringfence_core::FenceValue;

/// A violated ring invariant, reported by
/// [`FencedRingBuffer::verify_integrity`](crate::FencedRingBuffer::verify_integrity).
///
/// Any of these means the ring's head/tail/queue bookkeeping no longer
/// tiles the buffer and further allocations could alias live GPU data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntegrityError {
    /// The used-size counter disagrees with in-scope plus queued bytes.
    UsedMismatch {
        /// Value of the used-size counter.
        used: u64,
        /// Head usage + tail usage + queued bytes.
        expected: u64,
    },
    /// Used bytes plus free head/tail space do not add up to the capacity.
    CapacityMismatch {
        /// Used + free(head) + free(tail).
        accounted: u64,
        /// Capacity of the buffer resource.
        capacity: u64,
    },
    /// The head and tail windows share bytes.
    RangesOverlap {
        /// Head window as `(base, end)`.
        head: (u64, u64),
        /// Tail window as `(base, end)`.
        tail: (u64, u64),
    },
    /// A queued scope covers zero bytes.
    EmptyScope {
        /// Offset of the empty scope.
        offset: u64,
    },
    /// The oldest queued scope does not start where the tail window ends.
    OldestScopeDetached {
        /// Offset of the oldest queued scope.
        offset: u64,
        /// End of the tail window.
        tail_end: u64,
    },
    /// Queued scopes are not in non-decreasing fence order.
    FenceOrder {
        /// Fence of the earlier queued scope.
        earlier: FenceValue,
        /// Fence of the scope queued after it.
        later: FenceValue,
    },
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsedMismatch { used, expected } => {
                write!(f, "used size {used} does not match accounted {expected}")
            }
            Self::CapacityMismatch {
                accounted,
                capacity,
            } => {
                write!(f, "accounted {accounted} bytes in a {capacity}-byte ring")
            }
            Self::RangesOverlap { head, tail } => {
                write!(
                    f,
                    "head [{}, {}) overlaps tail [{}, {})",
                    head.0, head.1, tail.0, tail.1
                )
            }
            Self::EmptyScope { offset } => {
                write!(f, "queued scope at offset {offset} is empty")
            }
            Self::OldestScopeDetached { offset, tail_end } => {
                write!(
                    f,
                    "oldest queued scope at {offset} is not adjacent to tail end {tail_end}"
                )
            }
            Self::FenceOrder { earlier, later } => {
                write!(f, "queued fence {later} follows newer fence {earlier}")
            }
        }
    }
}

impl Error for IntegrityError {}
