//! Adaptive multidimensional integration of vector-valued integrands.
//!
//! - [`HCubature`]: h-adaptive, bisects the region with the largest error.
//! - [`PCubature`]: p-adaptive, raises the Clenshaw–Curtis level of the
//!   dimension with the largest error on the whole box.
//!
//! Both share the driver in this module: argument validation, the
//! zero-dimensional case, infinite-bound mapping and batch evaluation.

mod hcubature;
mod infinite;
mod pcubature;

pub use hcubature::HCubature;
pub use pcubature::PCubature;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{IntegError, IntegResult};
use crate::integrator::IntegStatus;
use infinite::Mapped;

/// How component errors are combined when testing convergence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorNorm {
    /// Every component must meet the tolerance on its own.
    #[default]
    Individual,
    /// Consecutive components are treated as the real and imaginary parts
    /// of a complex value.
    Paired,
    L2,
    L1,
    LInf,
}

impl ErrorNorm {
    /// Whether `errors` meet `max(tol_abs, tol_rel·|values|)` under this norm.
    pub fn converged(self, values: &[f64], errors: &[f64], tol_abs: f64, tol_rel: f64) -> bool {
        let fails = |e: f64, v: f64| e > tol_abs && e > v.abs() * tol_rel;
        match self {
            ErrorNorm::Individual => values.iter().zip(errors).all(|(&v, &e)| !fails(e, v)),
            ErrorNorm::Paired => {
                let mut j = 0;
                while j + 1 < values.len() {
                    let maxerr = errors[j].max(errors[j + 1]);
                    let maxval = values[j].max(values[j + 1]);
                    // scaled to avoid overflow/underflow
                    let serr = if maxerr > 0.0 { 1.0 / maxerr } else { 1.0 };
                    let sval = if maxval > 0.0 { 1.0 / maxval } else { 1.0 };
                    let err = (errors[j] * serr).hypot(errors[j + 1] * serr) * maxerr;
                    let val = (values[j] * sval).hypot(values[j + 1] * sval) * maxval;
                    if err > tol_abs && err > val * tol_rel {
                        return false;
                    }
                    j += 2;
                }
                j >= values.len() || !fails(errors[j], values[j])
            }
            ErrorNorm::L1 => {
                let err: f64 = errors.iter().sum();
                let val: f64 = values.iter().map(|v| v.abs()).sum();
                err <= tol_abs || err <= val * tol_rel
            }
            ErrorNorm::LInf => {
                let err = errors.iter().fold(0.0_f64, |m, &e| m.max(e));
                let val = values.iter().fold(0.0_f64, |m, &v| m.max(v.abs()));
                err <= tol_abs || err <= val * tol_rel
            }
            ErrorNorm::L2 => {
                let maxerr = errors.iter().fold(0.0_f64, |m, &e| m.max(e));
                let maxval = values.iter().fold(0.0_f64, |m, &v| m.max(v.abs()));
                let serr = if maxerr > 0.0 { 1.0 / maxerr } else { 1.0 };
                let sval = if maxval > 0.0 { 1.0 / maxval } else { 1.0 };
                let err = errors.iter().map(|e| (e * serr).powi(2)).sum::<f64>().sqrt() * maxerr;
                let val = values
                    .iter()
                    .map(|v| (v.abs() * sval).powi(2))
                    .sum::<f64>()
                    .sqrt()
                    * maxval;
                err <= tol_abs || err <= val * tol_rel
            }
        }
    }
}

/// Cubature configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CubatureConfig {
    /// Evaluation budget; must be positive
    pub max_evals: usize,
    pub tol_abs: f64,
    pub tol_rel: f64,
    pub norm: ErrorNorm,
    /// Distribute each evaluation batch over the rayon pool
    pub parallel: bool,
}

impl Default for CubatureConfig {
    fn default() -> Self {
        Self {
            max_evals: 100_000,
            tol_abs: 0.0,
            tol_rel: 1e-8,
            norm: ErrorNorm::Individual,
            parallel: false,
        }
    }
}

/// Result of a cubature run.
///
/// When the budget runs out the best estimate so far is returned with a
/// non-converged `status`.
#[derive(Clone, Debug, PartialEq)]
pub struct CubatureOutcome {
    pub values: Vec<f64>,
    pub errors: Vec<f64>,
    pub status: IntegStatus,
    /// Number of integrand evaluations (points)
    pub evals: usize,
}

impl CubatureOutcome {
    /// Budget too small for the first batch of points: nothing evaluated.
    pub(crate) fn budget_exhausted(fdim: usize) -> Self {
        Self {
            values: vec![0.0; fdim],
            errors: vec![f64::INFINITY; fdim],
            status: IntegStatus::MaxEvalsReached,
            evals: 0,
        }
    }
}

/// A vector-valued integrand `f: ℝ^dim → ℝ^fdim`.
///
/// Closures `Fn(&[f64], &mut [f64]) + Sync` implement this directly.
/// Integrands that vectorise well can override [`eval_batch`].
///
/// [`eval_batch`]: VectorIntegrand::eval_batch
pub trait VectorIntegrand: Sync {
    /// Write the `fdim` outputs at point `x` into `fval`.
    fn eval(&self, x: &[f64], fval: &mut [f64]);

    /// Evaluate at points stored contiguously in `pts` (`dim` coordinates
    /// each), writing `fdim` outputs per point into `fvals`.
    fn eval_batch(&self, dim: usize, pts: &[f64], fvals: &mut [f64]) {
        let npts = if dim == 0 { 1 } else { pts.len() / dim };
        let fdim = fvals.len() / npts.max(1);
        for i in 0..npts {
            self.eval(&pts[i * dim..(i + 1) * dim], &mut fvals[i * fdim..(i + 1) * fdim]);
        }
    }
}

impl<F> VectorIntegrand for F
where
    F: Fn(&[f64], &mut [f64]) + Sync,
{
    fn eval(&self, x: &[f64], fval: &mut [f64]) {
        self(x, fval)
    }
}

/// Common surface of the cubature rules.
pub trait Cubature {
    fn config(&self) -> &CubatureConfig;

    /// Integrate `f` over the box `[lower, upper]`. Bounds may be infinite.
    fn integ(
        &self,
        fdim: usize,
        f: &dyn VectorIntegrand,
        lower: &[f64],
        upper: &[f64],
    ) -> IntegResult<CubatureOutcome> {
        let cfg = *self.config();
        validate(&cfg, fdim, lower, upper)?;

        if lower.is_empty() {
            let mut values = vec![0.0; fdim];
            f.eval(&[], &mut values);
            return Ok(CubatureOutcome {
                values,
                errors: vec![0.0; fdim],
                status: IntegStatus::Converged,
                evals: 1,
            });
        }

        let mapped = Mapped::new(f, lower, upper);
        let mut out = self.integ_box(fdim, &mapped, &mapped.lower, &mapped.upper)?;
        if mapped.sign < 0.0 {
            out.values.iter_mut().for_each(|v| *v = -*v);
        }
        debug!(
            dim = lower.len(),
            fdim,
            evals = out.evals,
            status = ?out.status,
            "cubature finished"
        );
        if !out.status.is_converged() {
            warn!(status = ?out.status, evals = out.evals, "cubature did not reach tolerance");
        }
        Ok(out)
    }

    /// Rule-specific integration over a finite, ordered box of dimension ≥ 1.
    fn integ_box(
        &self,
        fdim: usize,
        f: &dyn VectorIntegrand,
        lower: &[f64],
        upper: &[f64],
    ) -> IntegResult<CubatureOutcome>;
}

fn validate(cfg: &CubatureConfig, fdim: usize, lower: &[f64], upper: &[f64]) -> IntegResult<()> {
    if cfg.max_evals == 0 {
        return Err(IntegError::InvalidInput {
            what: "max_evals must be positive".to_string(),
        });
    }
    if fdim == 0 {
        return Err(IntegError::InvalidInput {
            what: "integrand has no outputs".to_string(),
        });
    }
    if lower.len() != upper.len() {
        return Err(IntegError::InvalidInput {
            what: format!(
                "{} lower bounds but {} upper bounds",
                lower.len(),
                upper.len()
            ),
        });
    }
    if lower.iter().chain(upper).any(|v| v.is_nan()) {
        return Err(IntegError::InvalidInput {
            what: "integration bound is NaN".to_string(),
        });
    }
    for (a, b) in lower.iter().zip(upper) {
        if a.is_infinite() && a == b {
            return Err(IntegError::InvalidInput {
                what: "both bounds at the same infinity".to_string(),
            });
        }
    }
    Ok(())
}

/// Evaluate a batch of points, serially or over the rayon pool.
///
/// Each point is evaluated independently and written to its own slot, so
/// the parallel path produces exactly the serial values.
pub(crate) fn evaluate(
    f: &dyn VectorIntegrand,
    dim: usize,
    fdim: usize,
    pts: &[f64],
    fvals: &mut [f64],
    parallel: bool,
) {
    let npts = pts.len() / dim;
    if !parallel || npts < 2 {
        f.eval_batch(dim, pts, fvals);
        return;
    }
    let per_chunk = npts.div_ceil(4 * rayon::current_num_threads()).max(1);
    pts.par_chunks(per_chunk * dim)
        .zip(fvals.par_chunks_mut(per_chunk * fdim))
        .for_each(|(p, out)| f.eval_batch(dim, p, out));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn individual_requires_every_component() {
        let vals = [1.0, 1.0];
        assert!(ErrorNorm::Individual.converged(&vals, &[1e-9, 1e-9], 0.0, 1e-8));
        assert!(!ErrorNorm::Individual.converged(&vals, &[1e-9, 1e-7], 0.0, 1e-8));
        // L1 sums the two
        assert!(ErrorNorm::L1.converged(&vals, &[1e-9, 1e-8], 0.0, 1e-8));
    }

    #[test]
    fn paired_treats_odd_tail_individually() {
        let vals = [3.0, 4.0, 1.0];
        // |err pair| = 5e-9 against |val pair| = 5
        assert!(ErrorNorm::Paired.converged(&vals, &[3e-9, 4e-9, 1e-9], 0.0, 1.1e-9));
        assert!(!ErrorNorm::Paired.converged(&vals, &[3e-9, 4e-9, 5e-9], 0.0, 1.1e-9));
    }

    proptest! {
        #[test]
        fn single_component_norms_agree(
            v in -1e3_f64..1e3,
            e in 0.0_f64..1.0,
            tol_abs in 0.0_f64..1e-2,
            tol_rel in 0.0_f64..1e-2,
        ) {
            let ind = ErrorNorm::Individual.converged(&[v], &[e], tol_abs, tol_rel);
            for norm in [ErrorNorm::L1, ErrorNorm::LInf] {
                prop_assert_eq!(norm.converged(&[v], &[e], tol_abs, tol_rel), ind);
            }
            prop_assert_eq!(ErrorNorm::Paired.converged(&[v], &[e], tol_abs, tol_rel), ind);
        }

        #[test]
        fn absolute_norms_are_ordered(
            errs in proptest::collection::vec(0.0_f64..1.0, 1..6),
            tol_abs in 1e-3_f64..2.0,
        ) {
            // LInf ≤ L2 ≤ L1, so convergence propagates downwards
            let vals = vec![0.0; errs.len()];
            if ErrorNorm::L1.converged(&vals, &errs, tol_abs, 0.0) {
                prop_assert!(ErrorNorm::L2.converged(&vals, &errs, tol_abs * (1.0 + 1e-12), 0.0));
            }
            if ErrorNorm::L2.converged(&vals, &errs, tol_abs, 0.0) {
                prop_assert!(ErrorNorm::LInf.converged(&vals, &errs, tol_abs * (1.0 + 1e-12), 0.0));
            }
        }

        #[test]
        fn zero_error_always_converges(vals in proptest::collection::vec(-10.0_f64..10.0, 1..6)) {
            let errs = vec![0.0; vals.len()];
            for norm in [ErrorNorm::Individual, ErrorNorm::Paired, ErrorNorm::L1, ErrorNorm::L2, ErrorNorm::LInf] {
                prop_assert!(norm.converged(&vals, &errs, 0.0, 0.0));
            }
        }
    }
}
