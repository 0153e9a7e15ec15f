//! Covariance functions.

use std::f64::consts::{FRAC_PI_2, SQRT_2};

/// Covariance `k(x₁, x₂)` between two abscissas.
///
/// Derivatives are taken with respect to `x₁`. Implementations that cannot
/// supply them keep the defaults, and the matching interpolation call
/// reports [`crate::InterpError::Unsupported`].
pub trait Covariance {
    fn covar(&self, x1: f64, x2: f64) -> f64;

    fn deriv(&self, _x1: f64, _x2: f64) -> Option<f64> {
        None
    }

    fn deriv2(&self, _x1: f64, _x2: f64) -> Option<f64> {
        None
    }

    /// `∫ₐᵇ k(x, x₂) dx`
    fn integ(&self, _a: f64, _b: f64, _x2: f64) -> Option<f64> {
        None
    }
}

/// `k(x₁, x₂) = exp(-(x₁-x₂)²/(2ℓ²))`
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SquaredExp {
    pub len: f64,
}

impl SquaredExp {
    pub fn new(len: f64) -> Self {
        Self { len }
    }
}

impl Covariance for SquaredExp {
    fn covar(&self, x1: f64, x2: f64) -> f64 {
        let d = (x1 - x2) / self.len;
        (-0.5 * d * d).exp()
    }

    fn deriv(&self, x1: f64, x2: f64) -> Option<f64> {
        let l2 = self.len * self.len;
        Some(-(x1 - x2) / l2 * self.covar(x1, x2))
    }

    fn deriv2(&self, x1: f64, x2: f64) -> Option<f64> {
        let l2 = self.len * self.len;
        let d2 = (x1 - x2) * (x1 - x2);
        Some((d2 - l2) / (l2 * l2) * self.covar(x1, x2))
    }

    fn integ(&self, a: f64, b: f64, x2: f64) -> Option<f64> {
        let s = SQRT_2 * self.len;
        let erf_diff = libm::erf((b - x2) / s) - libm::erf((a - x2) / s);
        Some(self.len * FRAC_PI_2.sqrt() * erf_diff)
    }
}

/// Covariance from a plain function, without derivatives or integrals.
#[derive(Clone, Copy, Debug)]
pub struct CovarFn<F>(pub F);

impl<F: Fn(f64, f64) -> f64> Covariance for CovarFn<F> {
    fn covar(&self, x1: f64, x2: f64) -> f64 {
        (self.0)(x1, x2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn squared_exp_derivatives_match_differences() {
        let k = SquaredExp::new(0.7);
        let (x1, x2, h) = (0.3, -0.2, 1e-5);
        let fd = (k.covar(x1 + h, x2) - k.covar(x1 - h, x2)) / (2.0 * h);
        assert_relative_eq!(k.deriv(x1, x2).unwrap(), fd, max_relative = 1e-8);

        let fd2 = (k.deriv(x1 + h, x2).unwrap() - k.deriv(x1 - h, x2).unwrap()) / (2.0 * h);
        assert_relative_eq!(k.deriv2(x1, x2).unwrap(), fd2, max_relative = 1e-7);
    }

    #[test]
    fn squared_exp_integral_over_the_line() {
        let k = SquaredExp::new(1.3);
        let total = k.integ(-60.0, 60.0, 0.2).unwrap();
        assert_relative_eq!(total, 1.3 * (2.0 * std::f64::consts::PI).sqrt(), max_relative = 1e-12);
        // odd about the centre
        assert_relative_eq!(k.integ(0.2, 1.0, 0.2).unwrap(), -k.integ(0.2, -0.6, 0.2).unwrap());
    }

    #[test]
    fn plain_function_has_no_derivatives() {
        let k = CovarFn(|a: f64, b: f64| (-(a - b).abs()).exp());
        assert_eq!(k.covar(1.0, 1.0), 1.0);
        assert!(k.deriv(0.0, 1.0).is_none());
        assert!(k.integ(0.0, 1.0, 0.5).is_none());
    }
}
