//! Newton iteration on a finite-difference derivative.

use tracing::debug;

use crate::error::{RootError, RootResult};
use crate::solver::{Convergence, RootSolver};

/// Newton solver configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Converged when `|f(x)| ≤ tol_abs`
    pub tol_abs: f64,
    /// Converged when the full Newton step is below `tol_rel·max(|x|, 1)`
    pub tol_rel: f64,
    /// Relative finite-difference step
    pub fd_epsilon: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tol_abs: 1e-10,
            tol_rel: 1e-12,
            fd_epsilon: 1e-7,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
        }
    }
}

/// Derivative-free Newton solver with a backtracking line search.
///
/// The line search also backs off from trial points where the residual is
/// non-finite, which keeps the iteration inside the domain of residuals
/// that overflow outside it.
#[derive(Clone, Debug, Default)]
pub struct NewtonSolver {
    pub config: NewtonConfig,
}

impl NewtonSolver {
    pub fn new(config: NewtonConfig) -> Self {
        Self { config }
    }

    /// Forward difference, falling back to a backward one when `f(x+h)` is
    /// not finite.
    fn derivative(&self, x: f64, fx: f64, f: &mut dyn FnMut(f64) -> f64) -> Option<f64> {
        let h = self.config.fd_epsilon * x.abs().max(1.0);
        let fwd = f(x + h);
        let d = if fwd.is_finite() {
            (fwd - fx) / h
        } else {
            let bwd = f(x - h);
            (fx - bwd) / h
        };
        (d.is_finite() && d != 0.0).then_some(d)
    }

    fn iterate(&self, x: &mut f64, f: &mut dyn FnMut(f64) -> f64) -> RootResult<Convergence> {
        let cfg = &self.config;
        let mut fx = f(*x);
        if !fx.is_finite() {
            return Err(RootError::NonFinite { x: *x });
        }

        for iter in 0..cfg.max_iterations {
            if fx.abs() <= cfg.tol_abs {
                return Ok(Convergence::Converged { iterations: iter });
            }

            let Some(d) = self.derivative(*x, fx, f) else {
                debug!(x = *x, fx, "newton: derivative vanished");
                return Ok(Convergence::Failed {
                    iterations: iter,
                    residual: fx,
                });
            };
            let dx = -fx / d;

            // Line search on |f|
            let mut alpha = 1.0;
            let mut accepted = None;
            for _ in 0..cfg.max_line_search_iters {
                let x_new = *x + alpha * dx;
                let f_new = f(x_new);
                if f_new.is_finite() && f_new.abs() < fx.abs() {
                    accepted = Some((x_new, f_new));
                    break;
                }
                alpha *= cfg.line_search_beta;
            }
            let Some((x_new, f_new)) = accepted else {
                debug!(x = *x, fx, "newton: line search stagnated");
                return Ok(Convergence::Failed {
                    iterations: iter,
                    residual: fx,
                });
            };

            *x = x_new;
            fx = f_new;
            debug!(iter, x = *x, fx, alpha, "newton step");

            if dx.abs() <= cfg.tol_rel * x.abs().max(1.0) || fx == 0.0 {
                return Ok(Convergence::Converged {
                    iterations: iter + 1,
                });
            }
        }

        if fx.abs() <= cfg.tol_abs {
            return Ok(Convergence::Converged {
                iterations: cfg.max_iterations,
            });
        }
        Ok(Convergence::Failed {
            iterations: cfg.max_iterations,
            residual: fx,
        })
    }
}

impl RootSolver for NewtonSolver {
    fn solve(
        &self,
        x: &mut f64,
        f: &mut dyn FnMut(f64) -> f64,
        raise_on_failure: bool,
    ) -> RootResult<Convergence> {
        match self.iterate(x, f) {
            Ok(c) => c.finish(raise_on_failure),
            Err(RootError::NonFinite { x: at }) if !raise_on_failure => {
                debug!(x = at, "newton: non-finite starting residual");
                Ok(Convergence::Failed {
                    iterations: 0,
                    residual: f64::NAN,
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0 from x = 3
        let solver = NewtonSolver::default();
        let mut x = 3.0;
        let c = solver.solve(&mut x, &mut |x: f64| x * x - 4.0, true).unwrap();
        assert!(c.is_converged());
        assert!((x - 2.0).abs() < 1e-8);
    }

    #[test]
    fn line_search_avoids_non_finite_region() {
        // ln(x) - 1 is NaN for x < 0; the first full step from 8 lands there
        let solver = NewtonSolver::default();
        let mut x = 8.0;
        let c = solver.solve(&mut x, &mut |x: f64| x.ln() - 1.0, true).unwrap();
        assert!(c.is_converged());
        assert!((x - std::f64::consts::E).abs() < 1e-8);
    }

    #[test]
    fn failure_is_reported_or_raised() {
        let solver = NewtonSolver::new(NewtonConfig {
            max_iterations: 5,
            ..NewtonConfig::default()
        });
        // no real root
        let mut f = |x: f64| x * x + 1.0;

        let mut x = 3.0;
        let c = solver.solve(&mut x, &mut f, false).unwrap();
        assert!(!c.is_converged());

        let mut x = 3.0;
        assert!(solver.solve(&mut x, &mut f, true).is_err());
    }
}
