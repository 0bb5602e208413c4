//! Scalar trait for tensor element types.

use faer_traits::ComplexField;
use num_traits::Float;
use std::fmt::Debug;

/// Trait for scalar types supported by ndcontrastive.
///
/// This combines faer's `ComplexField`, which the channel reduction needs
/// for its matrix-vector product, with `num_traits::Float` for the
/// real-valued arithmetic of the loss (`sqrt`, `max`, `trunc`).
pub trait Scalar: ComplexField + Float + Copy + Debug + Default + Send + Sync + 'static {
    /// Convert a configuration value into this element type.
    fn from_f64(value: f64) -> Self;

    /// Widen to `f64` for reporting and gradient checks.
    fn to_f64_lossless(self) -> f64;

    /// Label truthiness: the value truncated toward zero is a nonzero integer.
    ///
    /// NaN is treated as zero, matching a saturating float-to-int cast.
    #[inline]
    fn is_truthy_label(self) -> bool {
        !self.is_nan() && self.trunc() != Self::zero()
    }
}

impl Scalar for f64 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_f64_lossless(self) -> f64 {
        self
    }
}

impl Scalar for f32 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_f64_lossless(self) -> f64 {
        f64::from(self)
    }
}
