//! Nonrelativistic fermions.
//!
//! At finite temperature the densities are complete Fermi–Dirac integrals of
//! `y = (ν - m·[rest mass included])/T`:
//!
//! - `n = g (2 m* T)^{3/2} Γ(3/2) F_{1/2}(y) / (4π²)`
//! - `ε = g (2 m* T)^{5/2} Γ(5/2) F_{3/2}(y) / (8π² m*)`
//!
//! with `P = 2ε/3` and `s = (5ε/3 - yTn)/T`, `ε` measured without the rest
//! mass. At zero temperature everything follows from the Fermi momentum.

use std::f64::consts::PI;
use std::sync::Arc;

use qs_core::{LOG_DBL_MIN, ensure_finite};
use qs_root::{BracketSearch, BracketingSolver, BrentSolver, NewtonSolver, RootSolver};
use qs_special::{fermi_dirac_3half, fermi_dirac_half};
use tracing::debug;

use crate::classical::ClassicalThermo;
use crate::error::{PartError, PartResult};
use crate::inversion::{Inversion, InversionStage};
use crate::particle::{Fermion, Particle};

const PI2: f64 = PI * PI;

/// `E_F/T` above which the density inversion is seeded from the Fermi energy.
const DEGENERATE_SEED: f64 = 10.0;

/// Nonrelativistic fermion thermodynamics.
///
/// The root solvers are shared handles; callers can swap them with
/// [`FermionNonrel::set_density_root`] and [`FermionNonrel::set_bracket_root`].
#[derive(Clone)]
pub struct FermionNonrel {
    density_root: Arc<dyn RootSolver>,
    bracket_root: Arc<dyn BracketingSolver>,
    pub search: BracketSearch,
    classical: ClassicalThermo,
}

impl Default for FermionNonrel {
    fn default() -> Self {
        Self {
            density_root: Arc::new(NewtonSolver::default()),
            bracket_root: Arc::new(BrentSolver::default()),
            search: BracketSearch::default(),
            classical: ClassicalThermo,
        }
    }
}

impl std::fmt::Debug for FermionNonrel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FermionNonrel")
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

/// Density from the solver variable `x = -y` at fixed `n/g` and `m*T`.
///
/// Arguments that would underflow the Fermi–Dirac integral give zero density,
/// which keeps the residual finite and monotone for the solver.
fn solve_fun(x: f64, n_over_g: f64, ms_t: f64) -> f64 {
    let nden = if !x.is_finite() || -x < LOG_DBL_MIN {
        0.0
    } else {
        fermi_dirac_half(-x).unwrap_or(f64::NAN) * PI.sqrt() / 2.0
    };
    nden * (2.0 * ms_t).powf(1.5) / (4.0 * PI2) / n_over_g - 1.0
}

impl FermionNonrel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_density_root(&mut self, solver: Arc<dyn RootSolver>) {
        self.density_root = solver;
    }

    pub fn set_bracket_root(&mut self, solver: Arc<dyn BracketingSolver>) {
        self.bracket_root = solver;
    }

    /// `kf = (6π² n / g)^{1/3}`
    pub fn kf_from_density(&self, f: &mut Fermion) {
        f.kf = (6.0 * PI2 * f.n / f.g).cbrt();
    }

    fn require_positive_ms(p: &Particle) -> PartResult<()> {
        if p.ms > 0.0 {
            Ok(())
        } else {
            Err(PartError::invalid(format!(
                "nonrelativistic fermions need a positive effective mass, got {}",
                p.ms
            )))
        }
    }

    /// Kinetic energy density at zero temperature.
    fn ed_zerot(p: &Particle, kf: f64) -> f64 {
        if kf > 0.0 {
            p.g * kf.powi(5) / (20.0 * PI2 * p.ms)
        } else {
            0.0
        }
    }

    pub fn calc_mu_zerot(&self, f: &mut Fermion) -> PartResult<()> {
        f.sync_non_interacting();
        f.check_masses()?;
        let arg = 2.0 * f.ms * f.nu_kinetic();
        f.kf = if arg > 0.0 { arg.sqrt() } else { 0.0 };
        let kf = f.kf;
        f.n = f.g * kf * kf * kf / (6.0 * PI2);
        f.ed = Self::ed_zerot(f, kf);
        if f.inc_rest_mass {
            f.ed += f.n * f.m;
        }
        f.pr = -f.ed + f.n * f.nu;
        f.en = 0.0;
        Ok(())
    }

    pub fn calc_density_zerot(&self, f: &mut Fermion) -> PartResult<()> {
        if f.non_interacting {
            f.ms = f.m;
        }
        f.check_masses()?;
        Self::require_positive_ms(f)?;
        if f.n.is_nan() || f.n < 0.0 {
            return Err(PartError::invalid(format!(
                "density must be non-negative, got {}",
                f.n
            )));
        }
        self.kf_from_density(f);
        let kf = f.kf;
        f.nu = kf * kf / (2.0 * f.ms);
        f.ed = Self::ed_zerot(f, kf);
        if f.inc_rest_mass {
            f.ed += f.n * f.m;
            f.nu += f.m;
        }
        f.pr = -f.ed + f.n * f.nu;
        f.en = 0.0;
        if f.non_interacting {
            f.mu = f.nu;
        }
        Ok(())
    }

    /// Energy density, entropy and pressure from `y`; the density too when
    /// `with_density` is set.
    fn finite_t(p: &mut Particle, t: f64, with_density: bool) -> PartResult<()> {
        let y = p.nu_kinetic() / t;
        let scale = 2.0 * p.ms * t;
        if with_density {
            p.n = fermi_dirac_half(y)? * PI.sqrt() / 2.0 * p.g * scale.powf(1.5) / (4.0 * PI2);
        }
        let ed_kin =
            fermi_dirac_3half(y)? * 0.75 * PI.sqrt() * p.g * scale.powf(2.5) / (8.0 * PI2 * p.ms);
        let rest = if p.inc_rest_mass { p.n * p.m } else { 0.0 };
        p.ed = ed_kin + rest;
        p.en = (5.0 * ed_kin / 3.0 - p.nu_kinetic() * p.n) / t;
        p.pr = 2.0 * ed_kin / 3.0;
        Ok(())
    }

    fn check_temperature(t: f64) -> PartResult<()> {
        if t.is_nan() || t < 0.0 {
            return Err(PartError::invalid(format!(
                "temperature must be non-negative, got {t}"
            )));
        }
        Ok(())
    }

    /// Densities from the chemical potential.
    pub fn calc_mu(&self, f: &mut Fermion, t: f64) -> PartResult<()> {
        Self::check_temperature(t)?;
        if t == 0.0 {
            return self.calc_mu_zerot(f);
        }
        f.sync_non_interacting();
        f.check_masses()?;
        Self::require_positive_ms(f)?;

        Self::finite_t(f, t, true)?;

        ensure_finite(f.nu, "fermion chemical potential")?;
        ensure_finite(f.n, "fermion density")?;
        Ok(())
    }

    /// Solve for `nu` from `n`, starting from the current `nu`.
    ///
    /// Strongly degenerate states start from the zero-temperature Fermi
    /// energy instead, which is within `O((T/E_F)²)` of the root.
    pub fn nu_from_n(&self, f: &mut Fermion, t: f64) -> PartResult<InversionStage> {
        let n_over_g = f.n / f.g;
        let ms_t = f.ms * t;
        let y_fermi = (6.0 * PI2 * n_over_g).powf(2.0 / 3.0) / (2.0 * ms_t);
        let mut nex = -f.nu_kinetic() / t;
        if y_fermi > DEGENERATE_SEED {
            nex = -y_fermi;
        } else if nex > -LOG_DBL_MIN * 0.9 || !nex.is_finite() {
            // far enough into the tail the integral underflows; start closer in
            nex = -LOG_DBL_MIN / 2.0;
        }
        let mut residual = |x: f64| solve_fun(x, n_over_g, ms_t);

        let seed_state = f.part.clone();
        let classical = self.classical;
        let mut reseed = move || -> PartResult<f64> {
            let mut trial = seed_state.clone();
            classical.calc_density(&mut trial, t)?;
            Ok(-trial.nu_kinetic() / t)
        };

        let snapshot = f.part.clone();
        let diagnostics = move || {
            format!(
                "n = {:e}, m = {:e}, ms = {:e}, T = {:e}, nu = {:e}, non_interacting = {}, inc_rest_mass = {}",
                snapshot.n,
                snapshot.m,
                snapshot.ms,
                t,
                snapshot.nu,
                snapshot.non_interacting,
                snapshot.inc_rest_mass
            )
        };

        let stage = Inversion {
            primary: self.density_root.as_ref(),
            bracketing: self.bracket_root.as_ref(),
            search: &self.search,
        }
        .run(&mut nex, &mut residual, &mut reseed, &diagnostics)?;

        f.nu = -nex * t + if f.inc_rest_mass { f.m } else { 0.0 };
        debug!(n = f.n, nu = f.nu, t, ?stage, "fermion density inverted");
        Ok(stage)
    }

    /// Chemical potential and the remaining densities from `n`.
    pub fn calc_density(&self, f: &mut Fermion, t: f64) -> PartResult<InversionStage> {
        f.check_masses()?;
        Self::check_temperature(t)?;
        if t == 0.0 {
            self.calc_density_zerot(f)?;
            return Ok(InversionStage::Analytic);
        }
        // n = 0 would need nu = -∞
        if f.n.is_nan() || f.n <= 0.0 {
            return Err(PartError::invalid(format!(
                "density must be positive at finite temperature, got {}",
                f.n
            )));
        }
        f.sync_non_interacting();
        Self::require_positive_ms(f)?;

        let stage = self.nu_from_n(f, t)?;
        if f.non_interacting {
            f.mu = f.nu;
        }
        Self::finite_t(f, t, false)?;
        Ok(stage)
    }
}
