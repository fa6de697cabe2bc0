//! Bound-enforcing reparameterizations for drivers that search an
//! unconstrained internal space.
//!
//! Two-sided limits map through a sine, one-sided limits through a square, so
//! any internal value lands inside the declared bounds without the adapter
//! ever rejecting a candidate.

/// Classified limit pair for one fitted slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundKind {
    Unbounded,
    LowerOnly(f64),
    UpperOnly(f64),
    TwoSided(f64, f64),
}

impl BoundKind {
    /// Classify a `(lower, upper)` pair; infinities mark missing bounds.
    pub fn from_limits(lower: f64, upper: f64) -> Self {
        match (lower.is_finite(), upper.is_finite()) {
            (true, true) => Self::TwoSided(lower, upper),
            (true, false) => Self::LowerOnly(lower),
            (false, true) => Self::UpperOnly(upper),
            (false, false) => Self::Unbounded,
        }
    }

    /// External (physical) value for an unconstrained internal one.
    pub fn to_constrained(self, internal: f64) -> f64 {
        match self {
            Self::Unbounded => internal,
            Self::LowerOnly(lower) => lower + internal * internal,
            Self::UpperOnly(upper) => upper - internal * internal,
            Self::TwoSided(lower, upper) => {
                lower + (upper - lower) * 0.5 * (internal.sin() + 1.0)
            }
        }
    }

    /// Internal value whose image under [`Self::to_constrained`] is `value`.
    ///
    /// `value` must already respect the bounds; out-of-bounds inputs are
    /// clamped onto them first.
    pub fn to_unconstrained(self, value: f64) -> f64 {
        match self {
            Self::Unbounded => value,
            Self::LowerOnly(lower) => (value.max(lower) - lower).sqrt(),
            Self::UpperOnly(upper) => (upper - value.min(upper)).sqrt(),
            Self::TwoSided(lower, upper) => {
                let unit = ((value.clamp(lower, upper) - lower) / (upper - lower)).clamp(0.0, 1.0);
                (2.0 * unit - 1.0).asin()
            }
        }
    }
}
