//! Relativistic Maxwell–Boltzmann gas.
//!
//! With `x = ms/T` and the full chemical potential `ν̃`:
//!
//! - `n  = g ms² T K₂(x) e^{ν̃/T} / (2π²)`
//! - `ε  = n (3T + ms K₁(x)/K₂(x))`
//! - `P  = nT`
//! - `s  = (ε + P - νn)/T`
//!
//! and the massless limit `n = g T³ e^{ν̃/T}/π²`, `ε = 3nT`. The inverse
//! problem is analytic.

use std::f64::consts::PI;

use qs_core::ensure_finite;
use qs_special::bessel_k_scaled;
use tracing::debug;

use crate::error::{PartError, PartResult};
use crate::particle::Particle;

/// Classical thermodynamics; stateless.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassicalThermo;

impl ClassicalThermo {
    pub fn new() -> Self {
        Self
    }

    /// `n·e^{-ν̃/T}`, the density per unit fugacity.
    fn density_per_fugacity(p: &Particle, t: f64) -> PartResult<(f64, f64)> {
        let pi2 = PI * PI;
        if p.ms == 0.0 {
            return Ok((p.g * t * t * t / pi2, 3.0 * t));
        }
        let x = p.ms / t;
        let k1 = bessel_k_scaled(1.0, x)?;
        let k2 = bessel_k_scaled(2.0, x)?;
        // K₂(x)e^{ν̃/T} = K₂s(x) e^{(ν̃-ms)/T}; the e^{-ms/T} goes into the exponent
        let per = p.g * p.ms * p.ms * t * k2 / (2.0 * pi2);
        Ok((per, 3.0 * t + p.ms * k1 / k2))
    }

    fn check(p: &Particle, t: f64) -> PartResult<()> {
        p.check_masses()?;
        if t.is_nan() || t <= 0.0 {
            return Err(PartError::invalid(format!(
                "temperature must be positive for a classical gas, got {t}"
            )));
        }
        Ok(())
    }

    fn finish(p: &mut Particle, t: f64, energy_per_particle: f64) {
        p.ed = p.n * energy_per_particle - p.n * p.rest_offset();
        p.pr = p.n * t;
        p.en = (p.ed + p.pr - p.n * p.nu) / t;
    }

    pub fn calc_mu(&self, p: &mut Particle, t: f64) -> PartResult<()> {
        p.sync_non_interacting();
        Self::check(p, t)?;
        let (per, energy) = Self::density_per_fugacity(p, t)?;
        let exponent = if p.ms == 0.0 {
            p.nu_full() / t
        } else {
            (p.nu_full() - p.ms) / t
        };
        p.n = ensure_finite(per * exponent.exp(), "classical density")?;
        Self::finish(p, t, energy);
        Ok(())
    }

    /// Solve for `nu` (and `mu` when non-interacting) from `n`.
    pub fn calc_density(&self, p: &mut Particle, t: f64) -> PartResult<()> {
        if p.non_interacting {
            p.ms = p.m;
        }
        Self::check(p, t)?;
        if p.n.is_nan() || p.n <= 0.0 {
            return Err(PartError::invalid(format!(
                "density must be positive for inversion, got {}",
                p.n
            )));
        }
        let (per, energy) = Self::density_per_fugacity(p, t)?;
        let nu_full = if p.ms == 0.0 {
            t * (p.n / per).ln()
        } else {
            p.ms + t * (p.n / per).ln()
        };
        p.nu = nu_full - p.rest_offset();
        if p.non_interacting {
            p.mu = p.nu;
        }
        debug!(n = p.n, nu = p.nu, t, "classical inversion");
        Self::finish(p, t, energy);
        Ok(())
    }
}
