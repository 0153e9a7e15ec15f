use crate::QsError;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Floating point type used by the physics engines
pub type Real = f64;

/// Floating point types the numerical kernels are generic over.
///
/// Implemented for every `num_traits::Float` that can be built from an `f64`,
/// so `f32`, `f64` and wider software floats all instantiate the integrators.
pub trait Scalar: Float + FromPrimitive + Debug + Send + Sync + 'static {}

impl<T> Scalar for T where T: Float + FromPrimitive + Debug + Send + Sync + 'static {}

/// Convert an `f64` literal into the working precision.
#[inline]
pub fn cst<T: Scalar>(v: f64) -> T {
    T::from_f64(v).unwrap_or_else(T::nan)
}

/// Natural log of the smallest normalised `f64` (about -708.4).
pub const LOG_DBL_MIN: Real = -708.396_418_532_264_1;

/// Absolute/relative tolerance pair
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, QsError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(QsError::NonFinite { what, value: v })
    }
}

/// Replace a non-finite value by zero.
///
/// Integrands over thermal distributions routinely produce `inf`/`NaN` in
/// tails whose true contribution vanishes; they pass through here.
#[inline]
pub fn finite_or_zero<T: Scalar>(v: T) -> T {
    if v.is_finite() { v } else { T::zero() }
}
