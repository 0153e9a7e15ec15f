//! Brent–Dekker bracketing solver.

use tracing::debug;

use crate::bracket::{BracketSearch, expand_bracket};
use crate::error::{RootError, RootResult};
use crate::solver::{BracketingSolver, Convergence, RootSolver};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrentConfig {
    pub max_iterations: usize,
    /// Absolute tolerance on the bracket width
    pub tol_abs: f64,
    /// Relative tolerance on the bracket width
    pub tol_rel: f64,
    /// Search used by [`RootSolver::solve`] to build a bracket from a guess
    pub search: BracketSearch,
}

impl Default for BrentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tol_abs: 1e-14,
            tol_rel: 1e-12,
            search: BracketSearch::default(),
        }
    }
}

/// Bracketing solver: inverse quadratic interpolation and secant steps,
/// falling back to bisection whenever they would leave the bracket or
/// converge too slowly.
#[derive(Clone, Debug, Default)]
pub struct BrentSolver {
    pub config: BrentConfig,
}

impl BrentSolver {
    pub fn new(config: BrentConfig) -> Self {
        Self { config }
    }

    fn iterate(
        &self,
        lo: f64,
        hi: f64,
        f: &mut dyn FnMut(f64) -> f64,
    ) -> RootResult<(f64, Convergence)> {
        let cfg = &self.config;
        let (mut a, mut b) = (lo, hi);
        let (mut fa, mut fb) = (f(a), f(b));
        if !fa.is_finite() {
            return Err(RootError::NonFinite { x: a });
        }
        if !fb.is_finite() {
            return Err(RootError::NonFinite { x: b });
        }
        if fa == 0.0 {
            return Ok((a, Convergence::Converged { iterations: 0 }));
        }
        if fb == 0.0 {
            return Ok((b, Convergence::Converged { iterations: 0 }));
        }
        if fa.signum() == fb.signum() {
            return Err(RootError::NotBracketed {
                lo,
                hi,
                f_lo: fa,
                f_hi: fb,
            });
        }

        let (mut c, mut fc) = (b, fb);
        let mut d = b - a;
        let mut e = d;

        for iter in 0..cfg.max_iterations {
            if fb.signum() == fc.signum() {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * cfg.tol_abs.max(cfg.tol_rel * b.abs());
            let xm = 0.5 * (c - b);
            if xm.abs() <= tol || fb == 0.0 {
                debug!(iter, x = b, fx = fb, "brent converged");
                return Ok((b, Convergence::Converged { iterations: iter }));
            }

            if e.abs() >= tol && fa.abs() > fb.abs() {
                let s = fb / fa;
                let mut p;
                let mut q;
                if a == c {
                    // secant
                    p = 2.0 * xm * s;
                    q = 1.0 - s;
                } else {
                    // inverse quadratic interpolation
                    let qa = fa / fc;
                    let r = fb / fc;
                    p = s * (2.0 * xm * qa * (qa - r) - (b - a) * (r - 1.0));
                    q = (qa - 1.0) * (r - 1.0) * (s - 1.0);
                }
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();
                let min1 = 3.0 * xm * q - (tol * q).abs();
                let min2 = (e * q).abs();
                if 2.0 * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            b += if d.abs() > tol { d } else { tol.copysign(xm) };
            fb = f(b);
            if !fb.is_finite() {
                return Err(RootError::NonFinite { x: b });
            }
        }

        Ok((
            b,
            Convergence::Failed {
                iterations: cfg.max_iterations,
                residual: fb,
            },
        ))
    }
}

impl BracketingSolver for BrentSolver {
    fn solve_bracket(
        &self,
        lo: f64,
        hi: f64,
        f: &mut dyn FnMut(f64) -> f64,
        raise_on_failure: bool,
    ) -> RootResult<(f64, Convergence)> {
        match self.iterate(lo, hi, f) {
            Ok((x, c)) => Ok((x, c.finish(raise_on_failure)?)),
            Err(e) if raise_on_failure => Err(e),
            Err(e) => {
                debug!(error = %e, "brent failed");
                Ok((
                    0.5 * (lo + hi),
                    Convergence::Failed {
                        iterations: 0,
                        residual: f64::NAN,
                    },
                ))
            }
        }
    }
}

impl RootSolver for BrentSolver {
    /// Build a bracket around `x` with the configured search, then solve.
    fn solve(
        &self,
        x: &mut f64,
        f: &mut dyn FnMut(f64) -> f64,
        raise_on_failure: bool,
    ) -> RootResult<Convergence> {
        let Some((lo, hi)) = expand_bracket(*x, f, &self.config.search) else {
            return Convergence::Failed {
                iterations: self.config.search.max_expansions,
                residual: f(*x),
            }
            .finish(raise_on_failure);
        };
        let (root, c) = self.solve_bracket(lo, hi, f, raise_on_failure)?;
        if c.is_converged() {
            *x = root;
        }
        Ok(c)
    }
}
