//! Fence values stamped on batches of GPU work.

use std::fmt;

/// Monotonic counter stamped on a batch of submitted GPU work.
///
/// The allocators never generate fence values themselves. A single
/// driver role advances the "current" fence when work is submitted and
/// reports the "last completed" fence once the GPU has finished every
/// batch up to and including that stamp. `current >= completed` holds
/// at all times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FenceValue(pub u64);

impl FenceValue {
    /// The fence every allocator starts at.
    pub const ZERO: FenceValue = FenceValue(0);

    /// The fence immediately following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Distance from `earlier` to `self` using wrap-around arithmetic.
    ///
    /// Fence counters are not expected to wrap at realistic submission
    /// rates; if they ever did, this distance would be meaningless.
    pub fn wrapping_distance(self, earlier: FenceValue) -> u64 {
        self.0.wrapping_sub(earlier.0)
    }
}

impl fmt::Display for FenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FenceValue {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_order_numerically() {
        assert!(FenceValue(1) < FenceValue(2));
        assert_eq!(FenceValue::ZERO.next(), FenceValue(1));
        assert_eq!(FenceValue::default(), FenceValue::ZERO);
    }

    #[test]
    fn wrapping_distance_matches_plain_subtraction() {
        assert_eq!(FenceValue(10).wrapping_distance(FenceValue(4)), 6);
        assert_eq!(FenceValue(4).wrapping_distance(FenceValue(4)), 0);
    }

    #[test]
    fn wrapping_distance_wraps_when_earlier_is_ahead() {
        assert_eq!(FenceValue(0).wrapping_distance(FenceValue(1)), u64::MAX);
    }

    #[test]
    fn display_is_the_raw_counter() {
        assert_eq!(FenceValue(42).to_string(), "42");
        assert_eq!(FenceValue::from(7u64), FenceValue(7));
    }
}
