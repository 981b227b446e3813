//! Dynamic ring pool configuration, validation, and error types.
//!
//! [`DynamicRingConfig`] is the constructor input for
//! [`FencedDynamicRingBuffer`](crate::FencedDynamicRingBuffer).
//! [`validate()`](DynamicRingConfig::validate) checks the growth and
//! retirement parameters before the first ring is created.

use std::error::Error;
use std::fmt;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`DynamicRingConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `initial_capacity` is zero.
    ZeroInitialCapacity,
    /// `growth_multiplier` is below 2, so rings could never grow.
    GrowthMultiplierTooSmall {
        /// The configured multiplier.
        multiplier: u64,
    },
    /// `max_rings` is `Some(0)`; the primary ring alone needs one slot.
    MaxRingsZero,
    /// `max_ring_capacity` is smaller than the primary ring.
    MaxCapacityBelowInitial {
        /// The configured maximum.
        max: u64,
        /// The configured initial capacity.
        initial: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInitialCapacity => write!(f, "initial_capacity must be at least 1"),
            Self::GrowthMultiplierTooSmall { multiplier } => {
                write!(f, "growth_multiplier must be >= 2, got {multiplier}")
            }
            Self::MaxRingsZero => write!(f, "max_rings must be at least 1"),
            Self::MaxCapacityBelowInitial { max, initial } => {
                write!(
                    f,
                    "max_ring_capacity {max} is below initial_capacity {initial}"
                )
            }
        }
    }
}

impl Error for ConfigError {}

// ── DynamicRingConfig ──────────────────────────────────────────────

/// Growth and retirement policy for a dynamic ring pool.
///
/// The pool always keeps one ring of `initial_capacity` bytes. Extra
/// rings have capacity `initial_capacity * growth_multiplier^k` for
/// `k >= 1` and are released once they sit empty for more than
/// `ring_lifetime` fences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicRingConfig {
    /// Capacity in bytes of the primary ring, which is never retired.
    pub initial_capacity: u64,
    /// Factor between successive ring capacities. Default: 2. Must be >= 2.
    pub growth_multiplier: u64,
    /// Fences an empty non-primary ring survives after its last
    /// allocation. Default: 0 (retire as soon as it is empty).
    pub ring_lifetime: u64,
    /// Upper bound on the number of live rings, primary included.
    /// Default: unbounded.
    pub max_rings: Option<usize>,
    /// Upper bound on a single ring's capacity in bytes.
    /// Default: unbounded (growth stops only on `u64` overflow).
    pub max_ring_capacity: Option<u64>,
}

impl DynamicRingConfig {
    /// Default growth multiplier.
    pub const DEFAULT_GROWTH_MULTIPLIER: u64 = 2;

    /// Default idle lifetime for non-primary rings.
    pub const DEFAULT_RING_LIFETIME: u64 = 0;

    /// Config with the given primary capacity and defaults elsewhere.
    pub fn new(initial_capacity: u64) -> Self {
        Self {
            initial_capacity,
            growth_multiplier: Self::DEFAULT_GROWTH_MULTIPLIER,
            ring_lifetime: Self::DEFAULT_RING_LIFETIME,
            max_rings: None,
            max_ring_capacity: None,
        }
    }

    /// Set [`growth_multiplier`](Self::growth_multiplier).
    pub fn with_growth_multiplier(mut self, multiplier: u64) -> Self {
        self.growth_multiplier = multiplier;
        self
    }

    /// Set [`ring_lifetime`](Self::ring_lifetime).
    pub fn with_ring_lifetime(mut self, lifetime: u64) -> Self {
        self.ring_lifetime = lifetime;
        self
    }

    /// Set [`max_rings`](Self::max_rings).
    pub fn with_max_rings(mut self, max: usize) -> Self {
        self.max_rings = Some(max);
        self
    }

    /// Set [`max_ring_capacity`](Self::max_ring_capacity).
    pub fn with_max_ring_capacity(mut self, max: u64) -> Self {
        self.max_ring_capacity = Some(max);
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::ZeroInitialCapacity);
        }
        if self.growth_multiplier < 2 {
            return Err(ConfigError::GrowthMultiplierTooSmall {
                multiplier: self.growth_multiplier,
            });
        }
        if self.max_rings == Some(0) {
            return Err(ConfigError::MaxRingsZero);
        }
        if let Some(max) = self.max_ring_capacity {
            if max < self.initial_capacity {
                return Err(ConfigError::MaxCapacityBelowInitial {
                    max,
                    initial: self.initial_capacity,
                });
            }
        }
        Ok(())
    }

    /// Capacity of the `k`-th growth step: `initial * multiplier^k`.
    ///
    /// Returns `None` on overflow.
    pub fn ring_capacity(&self, k: u32) -> Option<u64> {
        self.growth_multiplier
            .checked_pow(k)
            .and_then(|factor| self.initial_capacity.checked_mul(factor))
    }
}
