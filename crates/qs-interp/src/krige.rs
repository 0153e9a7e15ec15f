//! Kriging with a caller-supplied covariance.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::covariance::Covariance;
use crate::error::{InterpError, InterpResult};

/// Minimum number of data points.
pub const MIN_SIZE: usize = 2;

/// Decomposition used to solve `K w = y`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MatrixMode {
    #[default]
    Cholesky,
    Lu,
}

/// One-dimensional interpolation interface.
pub trait Interpolator {
    fn eval(&self, x0: f64) -> f64;

    fn deriv(&self, x0: f64) -> InterpResult<f64>;

    fn deriv2(&self, x0: f64) -> InterpResult<f64>;

    /// `∫ₐᵇ y(x) dx`
    fn integ(&self, a: f64, b: f64) -> InterpResult<f64>;
}

/// Solution of `K w = y` together with `ln det K`.
#[derive(Clone, Debug)]
pub(crate) struct Factored {
    pub weights: DVector<f64>,
    pub ln_det: f64,
}

/// Covariance matrix over `x` with `noise_var` added to the diagonal.
pub(crate) fn covariance_matrix<C: Covariance + ?Sized>(
    covar: &C,
    x: &[f64],
    noise_var: f64,
) -> DMatrix<f64> {
    let n = x.len();
    let mut k = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let v = covar.covar(x[i], x[j]);
            k[(i, j)] = v;
            k[(j, i)] = v;
        }
        k[(i, i)] += noise_var;
    }
    k
}

pub(crate) fn factor_solve(
    k: DMatrix<f64>,
    y: &DVector<f64>,
    mode: MatrixMode,
) -> InterpResult<Factored> {
    let singular = InterpError::Singular { mode };
    match mode {
        MatrixMode::Cholesky => {
            let chol = k.cholesky().ok_or(singular)?;
            let ln_det = 2.0 * chol.l_dirty().diagonal().iter().map(|d| d.ln()).sum::<f64>();
            Ok(Factored {
                weights: chol.solve(y),
                ln_det,
            })
        }
        MatrixMode::Lu => {
            let lu = k.lu();
            let diag = lu.u().diagonal();
            if diag.iter().any(|d| *d == 0.0) {
                return Err(singular);
            }
            let ln_det = diag.iter().map(|d| d.abs().ln()).sum::<f64>();
            let weights = lu.solve(y).ok_or(singular)?;
            Ok(Factored { weights, ln_det })
        }
    }
}

pub(crate) fn check_data(x: &[f64], y: &[f64]) -> InterpResult<()> {
    if x.len() != y.len() {
        return Err(InterpError::InvalidInput {
            what: format!("{} abscissas but {} ordinates", x.len(), y.len()),
        });
    }
    if x.len() < MIN_SIZE {
        return Err(InterpError::InvalidInput {
            what: format!("need at least {MIN_SIZE} points, got {}", x.len()),
        });
    }
    if let Some(v) = x.iter().chain(y).find(|v| !v.is_finite()) {
        return Err(InterpError::InvalidInput {
            what: format!("data contains non-finite value {v}"),
        });
    }
    Ok(())
}

/// Gaussian-process interpolant `y(x₀) = Σᵢ k(x₀, xᵢ) wᵢ` with
/// `w = (K + σ²I)⁻¹ y`.
#[derive(Clone, Debug)]
pub struct KrigeInterp<C> {
    covar: C,
    x: Vec<f64>,
    weights: DVector<f64>,
}

impl<C: Covariance> KrigeInterp<C> {
    /// Fit without noise.
    pub fn new(x: &[f64], y: &[f64], covar: C, mode: MatrixMode) -> InterpResult<Self> {
        Self::with_noise(x, y, covar, 0.0, mode)
    }

    /// Fit with `noise_var` added to the diagonal of the covariance matrix.
    pub fn with_noise(
        x: &[f64],
        y: &[f64],
        covar: C,
        noise_var: f64,
        mode: MatrixMode,
    ) -> InterpResult<Self> {
        check_data(x, y)?;
        if noise_var.is_nan() || noise_var < 0.0 {
            return Err(InterpError::InvalidInput {
                what: format!("noise variance must be non-negative, got {noise_var}"),
            });
        }
        let k = covariance_matrix(&covar, x, noise_var);
        let fac = factor_solve(k, &DVector::from_column_slice(y), mode)?;
        debug!(n = x.len(), noise_var, ?mode, "kriging weights solved");
        Ok(Self {
            covar,
            x: x.to_vec(),
            weights: fac.weights,
        })
    }

    pub fn covariance(&self) -> &C {
        &self.covar
    }

    pub fn weights(&self) -> &[f64] {
        self.weights.as_slice()
    }

    fn sum_with(
        &self,
        what: &'static str,
        mut term: impl FnMut(f64) -> Option<f64>,
    ) -> InterpResult<f64> {
        let mut sum = 0.0;
        for (xi, wi) in self.x.iter().zip(self.weights.iter()) {
            sum += term(*xi).ok_or(InterpError::Unsupported { what })? * wi;
        }
        Ok(sum)
    }
}

impl<C: Covariance> Interpolator for KrigeInterp<C> {
    fn eval(&self, x0: f64) -> f64 {
        self.x
            .iter()
            .zip(self.weights.iter())
            .map(|(xi, wi)| self.covar.covar(x0, *xi) * wi)
            .sum()
    }

    fn deriv(&self, x0: f64) -> InterpResult<f64> {
        self.sum_with("a first derivative", |xi| self.covar.deriv(x0, xi))
    }

    fn deriv2(&self, x0: f64) -> InterpResult<f64> {
        self.sum_with("a second derivative", |xi| self.covar.deriv2(x0, xi))
    }

    fn integ(&self, a: f64, b: f64) -> InterpResult<f64> {
        self.sum_with("an integral", |xi| self.covar.integ(a, b, xi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::{CovarFn, SquaredExp};
    use approx::assert_relative_eq;

    fn grid(n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| i as f64 * 0.25).collect();
        let y = x.iter().map(|v| v.sin()).collect();
        (x, y)
    }

    #[test]
    fn reproduces_the_nodes() {
        let (x, y) = grid(8);
        let k = KrigeInterp::new(&x, &y, SquaredExp::new(0.3), MatrixMode::Cholesky).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert_relative_eq!(k.eval(*xi), *yi, epsilon = 1e-8);
        }
    }

    #[test]
    fn lu_and_cholesky_agree() {
        let (x, y) = grid(10);
        let c = KrigeInterp::new(&x, &y, SquaredExp::new(0.3), MatrixMode::Cholesky).unwrap();
        let l = KrigeInterp::new(&x, &y, SquaredExp::new(0.3), MatrixMode::Lu).unwrap();
        for x0 in [0.1, 0.8, 1.7] {
            assert_relative_eq!(c.eval(x0), l.eval(x0), epsilon = 1e-10);
        }
    }

    #[test]
    fn log_determinant_of_known_matrix() {
        let k = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_column_slice(&[1.0, 0.0]);
        for mode in [MatrixMode::Cholesky, MatrixMode::Lu] {
            let fac = factor_solve(k.clone(), &y, mode).unwrap();
            assert_relative_eq!(fac.ln_det, 3.0_f64.ln(), epsilon = 1e-14);
            assert_relative_eq!(fac.weights[0], 2.0 / 3.0, epsilon = 1e-14);
            assert_relative_eq!(fac.weights[1], -1.0 / 3.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn duplicate_points_without_noise_are_singular() {
        let x = [1.0, 1.0];
        let y = [0.0, 1.0];
        for mode in [MatrixMode::Cholesky, MatrixMode::Lu] {
            let err = KrigeInterp::new(&x, &y, SquaredExp::new(1.0), mode).unwrap_err();
            assert_eq!(err, InterpError::Singular { mode });
        }
        // noise regularises the same data
        assert!(KrigeInterp::with_noise(&x, &y, SquaredExp::new(1.0), 1e-3, MatrixMode::Cholesky).is_ok());
    }

    #[test]
    fn plain_covariance_evaluates_but_has_no_derivative() {
        let (x, y) = grid(5);
        let k = KrigeInterp::new(
            &x,
            &y,
            CovarFn(|a: f64, b: f64| (-(a - b).abs() / 0.3).exp()),
            MatrixMode::Cholesky,
        )
        .unwrap();
        assert_relative_eq!(k.eval(x[2]), y[2], epsilon = 1e-10);
        assert!(matches!(k.deriv(0.3), Err(InterpError::Unsupported { .. })));
        assert!(matches!(k.integ(0.0, 1.0), Err(InterpError::Unsupported { .. })));
    }

    #[test]
    fn rejects_bad_data() {
        let se = SquaredExp::new(1.0);
        assert!(KrigeInterp::new(&[0.0], &[1.0], se, MatrixMode::Cholesky).is_err());
        assert!(KrigeInterp::new(&[0.0, 1.0], &[1.0], se, MatrixMode::Cholesky).is_err());
        assert!(KrigeInterp::new(&[0.0, f64::NAN], &[1.0, 2.0], se, MatrixMode::Cholesky).is_err());
        assert!(KrigeInterp::with_noise(&[0.0, 1.0], &[1.0, 2.0], se, -1.0, MatrixMode::Lu).is_err());
    }
}
