//! Numerical primitives: the standard normal distribution and random number generation.

pub mod fast_rng;

use statrs::function::erf::erfc;
use std::f64::consts::FRAC_1_SQRT_2;

/// Standard normal density.
#[inline]
pub fn normal_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF through the complementary error function.
///
/// `N(x) = erfc(-x / sqrt(2)) / 2`. Relative error stays around 1e-10 in the lower tail,
/// where `1 - N(-x)` would lose every digit.
#[inline]
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}
