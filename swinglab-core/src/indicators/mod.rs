//! Indicator math shared by the evaluators.
//!
//! Series functions take oldest-first slices and return a same-length
//! vector with NaN for positions where the window has not filled. Callers
//! read the last element for "as-of" values.

pub mod atr;
pub mod sma;
pub mod stats;

pub use atr::{atr, true_range, wilder_smooth};
pub use sma::sma;
pub use stats::{lsq_slope, pearson, window_return};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
