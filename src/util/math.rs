//! Scalar helpers shared by decoding and mask assembly.

/// Logistic function `1 / (1 + e^-x)`.
#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Ceil division for grid sizes.
#[inline]
pub(crate) fn div_ceil(value: usize, divisor: usize) -> usize {
    value.div_ceil(divisor)
}
