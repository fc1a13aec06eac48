//! Indicator helpers.
//!
//! Plain functions over bar or value slices. Every output has the same length
//! as its input and is NaN where the lookback is not yet satisfied.

pub mod atr;
pub mod body;
pub mod ema;

pub use atr::{atr, true_range};
pub use body::average_body;
pub use ema::ema_of_series;

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
