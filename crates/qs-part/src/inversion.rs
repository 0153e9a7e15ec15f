//! Density → chemical potential inversion shared by the engines.
//!
//! Escalation on a residual `r(x)`:
//! 1. primary solver from the caller's guess;
//! 2. symmetric bracket search around the guess, then the bracketing solver;
//! 3. a reseeded guess (from the classical gas) and the primary solver again;
//! 4. [`PartError::InversionFailed`] with the caller's diagnostics.
//!
//! Every solve runs with `raise_on_failure = false` so a failure moves the
//! escalation on instead of returning.

use qs_root::{BracketSearch, BracketingSolver, RootSolver, expand_bracket};
use tracing::{debug, error, warn};

use crate::error::{PartError, PartResult};

pub(crate) struct Inversion<'a> {
    pub primary: &'a dyn RootSolver,
    pub bracketing: &'a dyn BracketingSolver,
    pub search: &'a BracketSearch,
}

/// How `calc_density` obtained the chemical potential.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InversionStage {
    /// Closed form, no solve
    Analytic,
    Primary,
    Bracketed,
    Reseeded,
}

impl Inversion<'_> {
    fn primary(&self, x: &mut f64, residual: &mut dyn FnMut(f64) -> f64) -> bool {
        let start = *x;
        match self.primary.solve(x, residual, false) {
            Ok(c) if c.is_converged() => true,
            Ok(c) => {
                debug!(start, outcome = ?c, "primary solve failed");
                false
            }
            Err(e) => {
                debug!(start, error = %e, "primary solve failed");
                false
            }
        }
    }

    /// Run the escalation; `x` holds the guess on entry and the root on
    /// success. `reseed` is only called when the first two stages fail.
    pub fn run(
        &self,
        x: &mut f64,
        residual: &mut dyn FnMut(f64) -> f64,
        reseed: &mut dyn FnMut() -> PartResult<f64>,
        diagnostics: &dyn Fn() -> String,
    ) -> PartResult<InversionStage> {
        let guess = *x;
        if self.primary(x, residual) {
            return Ok(InversionStage::Primary);
        }

        warn!(guess, "primary density solve failed, searching for a bracket");
        if let Some((lo, hi)) = expand_bracket(guess, residual, self.search) {
            match self.bracketing.solve_bracket(lo, hi, residual, false) {
                Ok((root, c)) if c.is_converged() => {
                    *x = root;
                    return Ok(InversionStage::Bracketed);
                }
                Ok((_, c)) => debug!(lo, hi, outcome = ?c, "bracketing solve failed"),
                Err(e) => debug!(lo, hi, error = %e, "bracketing solve failed"),
            }
        }

        warn!(guess, "bracketing failed, reseeding from the classical gas");
        match reseed() {
            Ok(seed) if seed.is_finite() => {
                *x = seed;
                if self.primary(x, residual) {
                    return Ok(InversionStage::Reseeded);
                }
            }
            Ok(seed) => debug!(seed, "classical reseed is not finite"),
            Err(e) => debug!(error = %e, "classical reseed failed"),
        }

        let diagnostics = diagnostics();
        error!(%diagnostics, "density inversion failed");
        Err(PartError::InversionFailed { diagnostics })
    }
}
