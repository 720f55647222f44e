//! Sampling priorities.
//!
//! Every admitted event is tagged with a priority drawn uniformly from the unit
//! interval. Retention keeps the highest priorities seen, which is the A-Res
//! scheme (Efraimidis & Spirakis, 2006) specialised to equal weights: each event
//! in a stream of `n` survives with probability `k / n`.
//!
//! Priorities are comparable across reservoirs because they all come from the
//! same distribution, so merging can reuse them instead of redrawing.

use std::cmp::Ordering;
use std::fmt;

use rand::Rng;

/// Random retention key in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Priority(f64);

impl Priority {
    /// Lowest possible priority.
    pub const MIN: Priority = Priority(0.0);
    /// Highest possible priority.
    pub const MAX: Priority = Priority(1.0);

    /// Build a priority from an explicit value, clamped into `[0, 1]`.
    ///
    /// `NaN` maps to [`Priority::MIN`].
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Draw a priority uniformly from `[0, 1)`.
    #[inline]
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.random::<f64>())
    }

    /// The raw key.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}
