//! Kriging with a fitted squared-exponential length scale.

use nalgebra::DVector;
use tracing::{debug, warn};

use crate::covariance::{Covariance, SquaredExp};
use crate::error::{InterpError, InterpResult};
use crate::krige::{
    Interpolator, KrigeInterp, MatrixMode, check_data, covariance_matrix, factor_solve,
};

/// Objective minimised over the length scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum QualityMode {
    /// Sum of squared leave-one-out prediction errors
    #[default]
    LeaveOneOut,
    /// Negative log marginal likelihood, `½ yᵀK⁻¹y + ½ ln det K`
    MaxLikelihood,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KrigeConfig {
    /// Number of log-spaced length scales tried
    pub nlen: usize,
    pub mode: QualityMode,
    pub matrix_mode: MatrixMode,
}

impl Default for KrigeConfig {
    fn default() -> Self {
        Self {
            nlen: 20,
            mode: QualityMode::default(),
            matrix_mode: MatrixMode::default(),
        }
    }
}

/// Kriging interpolant whose squared-exponential length scale is picked by
/// a grid search between `min |Δx| / 3` and `3·|x_last - x_first|`.
#[derive(Clone, Debug)]
pub struct KrigeOptim {
    interp: KrigeInterp<SquaredExp>,
    quality: f64,
}

impl KrigeOptim {
    /// Fit with noise variance `mean|y| / 10⁸`.
    pub fn set(x: &[f64], y: &[f64], config: &KrigeConfig) -> InterpResult<Self> {
        check_data(x, y)?;
        let mean_abs = y.iter().map(|v| v.abs()).sum::<f64>() / y.len() as f64;
        Self::set_noise(x, y, mean_abs / 1e8, config)
    }

    pub fn set_noise(
        x: &[f64],
        y: &[f64],
        noise_var: f64,
        config: &KrigeConfig,
    ) -> InterpResult<Self> {
        check_data(x, y)?;
        if config.nlen < 2 {
            return Err(InterpError::InvalidInput {
                what: format!("nlen must be at least 2, got {}", config.nlen),
            });
        }
        let min_gap = x
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(f64::INFINITY, f64::min);
        if min_gap == 0.0 {
            return Err(InterpError::InvalidInput {
                what: "neighbouring abscissas coincide".to_string(),
            });
        }

        let len_min = min_gap / 3.0;
        let len_max = (x[x.len() - 1] - x[0]).abs() * 3.0;
        let ratio = len_max / len_min;
        let mut best: Option<(f64, f64)> = None;
        for j in 0..config.nlen {
            let len = len_min * ratio.powf(j as f64 / (config.nlen - 1) as f64);
            match quality(x, y, len, noise_var, config) {
                Ok(q) => {
                    debug!(j, len, quality = q, "length scale tried");
                    if best.is_none_or(|(_, bq)| q < bq) {
                        best = Some((len, q));
                    }
                }
                Err(e) => warn!(j, len, error = %e, "length scale rejected"),
            }
        }
        let Some((len, quality)) = best else {
            return Err(InterpError::NoLengthScale { len_min, len_max });
        };

        let interp =
            KrigeInterp::with_noise(x, y, SquaredExp::new(len), noise_var, config.matrix_mode)?;
        debug!(len, quality, "kriging length scale chosen");
        Ok(Self { interp, quality })
    }

    /// Fitted length scale.
    pub fn length_scale(&self) -> f64 {
        self.interp.covariance().len
    }

    /// Objective value at the fitted length scale.
    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn interp(&self) -> &KrigeInterp<SquaredExp> {
        &self.interp
    }
}

impl Interpolator for KrigeOptim {
    fn eval(&self, x0: f64) -> f64 {
        self.interp.eval(x0)
    }

    fn deriv(&self, x0: f64) -> InterpResult<f64> {
        self.interp.deriv(x0)
    }

    fn deriv2(&self, x0: f64) -> InterpResult<f64> {
        self.interp.deriv2(x0)
    }

    fn integ(&self, a: f64, b: f64) -> InterpResult<f64> {
        self.interp.integ(a, b)
    }
}

fn quality(
    x: &[f64],
    y: &[f64],
    len: f64,
    noise_var: f64,
    config: &KrigeConfig,
) -> InterpResult<f64> {
    let covar = SquaredExp::new(len);
    match config.mode {
        QualityMode::LeaveOneOut => {
            let mut sum = 0.0;
            for k in 0..x.len() {
                let x2 = jackknife(x, k);
                let y2 = DVector::from_vec(jackknife(y, k));
                let fac = factor_solve(
                    covariance_matrix(&covar, &x2, noise_var),
                    &y2,
                    config.matrix_mode,
                )?;
                let pred: f64 = x2
                    .iter()
                    .zip(fac.weights.iter())
                    .map(|(xi, wi)| covar.covar(x[k], *xi) * wi)
                    .sum();
                sum += (y[k] - pred).powi(2);
            }
            Ok(sum)
        }
        QualityMode::MaxLikelihood => {
            let yv = DVector::from_column_slice(y);
            let fac = factor_solve(
                covariance_matrix(&covar, x, noise_var),
                &yv,
                config.matrix_mode,
            )?;
            Ok(0.5 * yv.dot(&fac.weights) + 0.5 * fac.ln_det)
        }
    }
}

/// Copy of `v` without element `k`.
fn jackknife(v: &[f64], k: usize) -> Vec<f64> {
    v.iter()
        .enumerate()
        .filter_map(|(i, val)| (i != k).then_some(*val))
        .collect()
}
