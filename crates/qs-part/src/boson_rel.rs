//! Relativistic bosons by direct integration.
//!
//! The regime is chosen from `ψ = (ν̃ - m*)/T`, where `ν̃` is the effective
//! chemical potential measured from zero. `ψ > 0` is unphysical without a
//! condensate and is rejected.
//!
//! - [`Regime::Degenerate`] (`ψ ≥ -0.5`): momentum integrals over
//!   `k ∈ [0, √((20T + ν̃)² - m*²)]` with the occupation from
//!   [`bose_function`].
//! - [`Regime::NonDegenerate`] (`ψ < -0.5`): integrals over the scaled
//!   kinetic energy `u = (E - m*)/T ∈ [0, ∞)`.
//!
//! The pressure always comes from `P = -ε + Ts + μn`.

use std::f64::consts::PI;
use std::sync::Arc;

use qs_core::{Tolerances, finite_or_zero, nearly_equal};
use qs_inte::{AdaptiveConfig, AdaptiveIntegrator, Integrator};
use qs_root::{BracketSearch, BracketingSolver, BrentSolver, NewtonSolver, RootSolver};
use qs_special::{DEFAULT_LIMIT, bose_function};
use tracing::{debug, warn};

use crate::classical::ClassicalThermo;
use crate::error::{PartError, PartResult};
use crate::inversion::{Inversion, InversionStage};
use crate::particle::{Boson, Particle, Thermo};

const PI2: f64 = PI * PI;

/// `ψ` below which the scaled-energy integrals are used.
pub const DEG_LIMIT: f64 = -0.5;

/// Upper momentum cut-off in units of `T` above the chemical potential.
pub const UPPER_LIMIT_FAC: f64 = 20.0;

/// Above this exponent the occupation is written in its rescaled form.
const RESCALE: f64 = 200.0;

/// Agreement expected between the target density and the density
/// recomputed at the inverted chemical potential.
const DENSITY_CHECK: Tolerances = Tolerances {
    abs: 0.0,
    rel: 1e-8,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Regime {
    Degenerate,
    NonDegenerate,
}

impl Regime {
    pub fn select(psi: f64) -> Self {
        if psi < DEG_LIMIT {
            Regime::NonDegenerate
        } else {
            Regime::Degenerate
        }
    }
}

/// Integrands for one particle state at one temperature.
///
/// Every method returns `0` where the raw expression is not finite; this
/// happens in the far tails and at integrable endpoint singularities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoseIntegrands {
    /// Effective mass
    pub ms: f64,
    /// Effective chemical potential measured from zero
    pub nu: f64,
    pub t: f64,
}

impl BoseIntegrands {
    pub fn new(p: &Particle, t: f64) -> Self {
        Self {
            ms: p.ms,
            nu: p.nu_full(),
            t,
        }
    }

    /// `η = m*/T`
    #[inline]
    fn eta(&self) -> f64 {
        self.ms / self.t
    }

    /// `y = ν̃/T`
    #[inline]
    fn y(&self) -> f64 {
        self.nu / self.t
    }

    #[inline]
    fn occupation(&self, k: f64) -> (f64, f64) {
        let e = k.hypot(self.ms);
        (e, bose_function(e, self.nu, self.t, DEFAULT_LIMIT))
    }

    pub fn deg_density(&self, k: f64) -> f64 {
        let (_, nx) = self.occupation(k);
        finite_or_zero(k * k * nx)
    }

    pub fn deg_energy(&self, k: f64) -> f64 {
        let (e, nx) = self.occupation(k);
        finite_or_zero(k * k * e * nx)
    }

    /// `k² [(1+n)ln(1+n) - n ln n]`
    pub fn deg_entropy(&self, k: f64) -> f64 {
        let (_, nx) = self.occupation(k);
        finite_or_zero(-k * k * (nx * nx.ln() - (1.0 + nx) * (1.0 + nx).ln()))
    }

    /// `(η+u)√(u²+2ηu)`, the phase-space weight in `u`.
    #[inline]
    fn weight(&self, u: f64) -> f64 {
        let eta = self.eta();
        (eta + u) * (u * u + 2.0 * eta * u).sqrt()
    }

    /// `1/(exp(η+u-y) - 1)`, rescaled when `y` and `η` are both large.
    #[inline]
    fn scaled_occupation(&self, u: f64) -> f64 {
        let (eta, y) = (self.eta(), self.y());
        if y - u > RESCALE && eta - u > RESCALE {
            1.0 / (eta + u - y).exp_m1()
        } else {
            y.exp() / ((eta + u).exp() - y.exp())
        }
    }

    pub fn density(&self, u: f64) -> f64 {
        finite_or_zero(self.weight(u) * self.scaled_occupation(u))
    }

    pub fn energy(&self, u: f64) -> f64 {
        finite_or_zero((self.eta() + u) * self.weight(u) * self.scaled_occupation(u))
    }

    /// Same entropy kernel as [`BoseIntegrands::deg_entropy`], written in
    /// `w = η + u - y` as `w/(eʷ-1) - ln(1-e⁻ʷ)` so it stays accurate in
    /// both tails.
    pub fn entropy(&self, u: f64) -> f64 {
        let (eta, y) = (self.eta(), self.y());
        if u - eta > RESCALE && u - y > RESCALE {
            return 0.0;
        }
        let w = eta + u - y;
        let kernel = w / w.exp_m1() - (-(-w).exp()).ln_1p();
        finite_or_zero(self.weight(u) * kernel)
    }
}

/// Relativistic boson thermodynamics.
///
/// Integrators and root solvers are shared handles so callers can swap them
/// ([`BosonRel::set_inte`], [`BosonRel::set_density_root`]) and inspect them
/// after a calculation.
#[derive(Clone)]
pub struct BosonRel {
    /// Integrator over `u ∈ [0, ∞)`
    nit: Arc<dyn Integrator<f64>>,
    /// Integrator over `k ∈ [0, k_max]`
    dit: Arc<dyn Integrator<f64>>,
    density_root: Arc<dyn RootSolver>,
    bracket_root: Arc<dyn BracketingSolver>,
    pub search: BracketSearch,
    classical: ClassicalThermo,
}

impl Default for BosonRel {
    fn default() -> Self {
        let config = AdaptiveConfig {
            tol_abs: 0.0,
            tol_rel: 1e-10,
            max_subdivisions: 1000,
        };
        Self {
            nit: Arc::new(AdaptiveIntegrator::<f64>::new(config)),
            dit: Arc::new(AdaptiveIntegrator::<f64>::new(config)),
            density_root: Arc::new(NewtonSolver::default()),
            bracket_root: Arc::new(BrentSolver::default()),
            search: BracketSearch::default(),
            classical: ClassicalThermo,
        }
    }
}

impl std::fmt::Debug for BosonRel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BosonRel")
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

impl BosonRel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the non-degenerate and degenerate integrators.
    pub fn set_inte(&mut self, nit: Arc<dyn Integrator<f64>>, dit: Arc<dyn Integrator<f64>>) {
        self.nit = nit;
        self.dit = dit;
    }

    pub fn set_density_root(&mut self, solver: Arc<dyn RootSolver>) {
        self.density_root = solver;
    }

    pub fn set_bracket_root(&mut self, solver: Arc<dyn BracketingSolver>) {
        self.bracket_root = solver;
    }

    /// `ψ = (ν̃ - m*)/T`.
    ///
    /// For a non-interacting particle `ν` and `m*` are taken from `mu` and
    /// `m`, as every calculation does, so the result does not depend on
    /// stale effective values.
    pub fn psi(p: &Particle, t: f64) -> f64 {
        let mut q = p.clone();
        q.sync_non_interacting();
        Self::state_psi(&q, t)
    }

    /// `ψ` from the stored effective values.
    fn state_psi(p: &Particle, t: f64) -> f64 {
        (p.nu_full() - p.ms) / t
    }

    /// Number density, plus energy and entropy densities unless
    /// `density_only`. Assumes `T > 0` and `ψ ≤ 0`.
    fn integrate(&self, p: &Particle, t: f64, density_only: bool) -> PartResult<Thermo> {
        let psi = Self::state_psi(p, t);
        let regime = Regime::select(psi);
        let ig = BoseIntegrands::new(p, t);
        debug!(psi, ?regime, density_only, "boson regime");

        let mut th = Thermo::default();
        match regime {
            Regime::Degenerate => {
                let arg = (UPPER_LIMIT_FAC * t + ig.nu).powi(2) - p.ms * p.ms;
                if arg <= 0.0 {
                    return Err(PartError::invalid(
                        "zero density in the degenerate limit (momentum cut-off is not positive)",
                    ));
                }
                let ul = arg.sqrt();
                let prefac = p.g / (2.0 * PI2);
                th.n = self.dit.integ(&mut |k: f64| ig.deg_density(k), 0.0, ul)? * prefac;
                if !density_only {
                    th.ed = self.dit.integ(&mut |k: f64| ig.deg_energy(k), 0.0, ul)? * prefac;
                    th.en = self.dit.integ(&mut |k: f64| ig.deg_entropy(k), 0.0, ul)? * prefac;
                }
            }
            Regime::NonDegenerate => {
                let prefac = p.g * t.powi(3) / (2.0 * PI2);
                let inf = f64::INFINITY;
                th.n = self.nit.integ(&mut |u: f64| ig.density(u), 0.0, inf)? * prefac;
                if !density_only {
                    th.ed = self.nit.integ(&mut |u: f64| ig.energy(u), 0.0, inf)? * prefac * t;
                    th.en = self.nit.integ(&mut |u: f64| ig.entropy(u), 0.0, inf)? * prefac;
                }
            }
        }
        if !density_only {
            th.ed -= th.n * p.rest_offset();
        }
        Ok(th)
    }

    fn check_temperature(t: f64) -> PartResult<()> {
        if t.is_nan() || t <= 0.0 {
            return Err(PartError::invalid(format!(
                "temperature must be positive, got {t}"
            )));
        }
        Ok(())
    }

    /// Densities and pressure from the chemical potential.
    pub fn calc_mu(&self, b: &mut Boson, t: f64) -> PartResult<()> {
        Self::check_temperature(t)?;
        b.sync_non_interacting();
        b.check_masses()?;

        let psi = Self::state_psi(b, t);
        if psi > 0.0 {
            return Err(PartError::invalid(format!(
                "chemical potential exceeds the effective mass (psi = {psi})"
            )));
        }

        let th = self.integrate(b, t, false)?;
        b.n = th.n;
        b.ed = th.ed;
        b.en = th.en;
        b.pr = -b.ed + t * b.en + b.mu * b.n;
        Ok(())
    }

    /// Solve for `nu` from `n`, starting from the current `nu`.
    ///
    /// The solver variable is `x = ν/T`. Above `x_max` (where `ψ = 0`) the
    /// residual is continued linearly so it stays finite and monotone.
    pub fn nu_from_n(&self, b: &mut Boson, t: f64) -> PartResult<InversionStage> {
        let target = b.n;
        let x_max = (b.ms - b.rest_offset()) / t;
        let mut nex = (b.nu / t).min(x_max);
        if !nex.is_finite() {
            nex = 0.0;
        }

        let mut trial = b.part.clone();
        let mut residual = |x: f64| -> f64 {
            let xc = x.min(x_max);
            trial.nu = xc * t;
            match self.integrate(&trial, t, true) {
                Ok(th) => th.n / target - 1.0 + (x - xc),
                Err(_) => f64::NAN,
            }
        };

        let seed_state = b.part.clone();
        let classical = self.classical;
        let mut reseed = move || -> PartResult<f64> {
            let mut seed = seed_state.clone();
            classical.calc_density(&mut seed, t)?;
            Ok((seed.nu / t).min(x_max))
        };

        let snapshot = b.part.clone();
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

        if nex > x_max {
            return Err(PartError::InversionFailed {
                diagnostics: format!(
                    "density {target:e} exceeds the largest density without a condensate; {}",
                    diagnostics()
                ),
            });
        }
        b.nu = nex * t;
        debug!(n = target, nu = b.nu, t, ?stage, "boson density inverted");
        Ok(stage)
    }

    /// Chemical potential, energy and entropy densities and pressure from
    /// `n`. The density itself is left at its target value.
    pub fn calc_density(&self, b: &mut Boson, t: f64) -> PartResult<InversionStage> {
        Self::check_temperature(t)?;
        if b.n.is_nan() || b.n <= 0.0 {
            return Err(PartError::invalid(format!(
                "density must be positive, got {}",
                b.n
            )));
        }
        b.sync_non_interacting();
        b.check_masses()?;

        let stage = self.nu_from_n(b, t)?;
        if b.non_interacting {
            b.mu = b.nu;
        }

        let th = self.integrate(b, t, false)?;
        if !nearly_equal(th.n, b.n, DENSITY_CHECK) {
            warn!(target = b.n, recomputed = th.n, ?stage, "inverted boson density drifted");
        }
        b.ed = th.ed;
        b.en = th.en;
        b.pr = -b.ed + t * b.en + b.mu * b.n;
        Ok(stage)
    }

    /// Particle plus antiparticle: the net density and the summed energy,
    /// entropy and pressure.
    pub fn pair_mu(&self, b: &mut Boson, t: f64) -> PartResult<()> {
        b.sync_non_interacting();
        self.calc_mu(b, t)?;

        let mut anti = b.anti();
        self.calc_mu(&mut anti, t)?;
        b.n -= anti.n;
        b.pr += anti.pr;
        b.ed += anti.ed;
        b.en += anti.en;
        Ok(())
    }
}
