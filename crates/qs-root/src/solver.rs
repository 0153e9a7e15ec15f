//! Solver strategy traits.

use crate::error::{RootError, RootResult};

/// How a solve ended when it did not raise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Convergence {
    Converged { iterations: usize },
    Failed { iterations: usize, residual: f64 },
}

impl Convergence {
    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }

    /// `Err` for a failure when `raise` is set, the outcome otherwise.
    pub(crate) fn finish(self, raise: bool) -> RootResult<Self> {
        match self {
            Convergence::Failed {
                iterations,
                residual,
            } if raise => Err(RootError::NonConvergence {
                iterations,
                residual,
            }),
            other => Ok(other),
        }
    }
}

/// Finds `x` with `f(x) = 0` starting from the value in `x`.
///
/// On return `x` holds the root, or the last iterate when the solve failed.
/// With `raise_on_failure = false` a failure comes back as
/// `Ok(Convergence::Failed { .. })` so the caller can try something else.
pub trait RootSolver: Send + Sync {
    fn solve(
        &self,
        x: &mut f64,
        f: &mut dyn FnMut(f64) -> f64,
        raise_on_failure: bool,
    ) -> RootResult<Convergence>;
}

/// A solver that can also work from a sign-changing bracket.
pub trait BracketingSolver: RootSolver {
    /// Solve within `[lo, hi]`; `f(lo)` and `f(hi)` must differ in sign.
    fn solve_bracket(
        &self,
        lo: f64,
        hi: f64,
        f: &mut dyn FnMut(f64) -> f64,
        raise_on_failure: bool,
    ) -> RootResult<(f64, Convergence)>;
}
