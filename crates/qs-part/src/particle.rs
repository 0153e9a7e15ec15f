//! Particle state.
//!
//! All quantities are in natural units (ħ = c = k_B = 1), typically fm⁻¹.

use std::ops::{Deref, DerefMut};

use crate::error::{PartError, PartResult};

/// Thermodynamic state shared by every species.
///
/// `mass`, `degeneracy` and the flags are inputs. `mu`/`nu` are inputs for
/// `calc_mu` and outputs of `calc_density`; `n` is the reverse. The energy
/// density, entropy density and pressure are always outputs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Particle {
    /// Rest mass
    pub m: f64,
    /// Effective mass
    pub ms: f64,
    /// Degeneracy
    pub g: f64,
    /// Chemical potential
    pub mu: f64,
    /// Effective chemical potential
    pub nu: f64,
    pub n: f64,
    pub ed: f64,
    pub en: f64,
    pub pr: f64,
    /// Force `ms = m` and `nu = mu` before every calculation
    pub non_interacting: bool,
    /// Measure `mu`, `nu` and `ed` from zero rather than from the rest mass
    pub inc_rest_mass: bool,
}

impl Particle {
    pub fn new(mass: f64, degeneracy: f64) -> Self {
        Self {
            m: mass,
            ms: mass,
            g: degeneracy,
            mu: 0.0,
            nu: 0.0,
            n: 0.0,
            ed: 0.0,
            en: 0.0,
            pr: 0.0,
            non_interacting: true,
            inc_rest_mass: true,
        }
    }

    /// Rest mass to subtract when `inc_rest_mass` is false, zero otherwise.
    #[inline]
    pub fn rest_offset(&self) -> f64 {
        if self.inc_rest_mass { 0.0 } else { self.m }
    }

    /// `nu` measured from zero.
    #[inline]
    pub fn nu_full(&self) -> f64 {
        self.nu + self.rest_offset()
    }

    /// `nu - m` when the rest mass is included, `nu` otherwise.
    #[inline]
    pub fn nu_kinetic(&self) -> f64 {
        if self.inc_rest_mass {
            self.nu - self.m
        } else {
            self.nu
        }
    }

    pub(crate) fn sync_non_interacting(&mut self) {
        if self.non_interacting {
            self.nu = self.mu;
            self.ms = self.m;
        }
    }

    pub(crate) fn check_masses(&self) -> PartResult<()> {
        if self.m < 0.0 || !self.m.is_finite() {
            return Err(PartError::invalid(format!("mass must be non-negative, got {}", self.m)));
        }
        if !self.non_interacting && (self.ms < 0.0 || !self.ms.is_finite()) {
            return Err(PartError::invalid(format!(
                "effective mass must be non-negative, got {}",
                self.ms
            )));
        }
        if self.g.is_nan() || self.g <= 0.0 {
            return Err(PartError::invalid(format!(
                "degeneracy must be positive, got {}",
                self.g
            )));
        }
        Ok(())
    }

    /// Antiparticle: same masses and flags, chemical potentials negated.
    ///
    /// The negation applies to the full chemical potentials, so with the
    /// rest mass excluded `nu → -nu - 2m` and `mu → -mu - 2m`.
    pub fn anti(&self) -> Particle {
        let shift = 2.0 * self.rest_offset();
        Particle {
            mu: -self.mu - shift,
            nu: -self.nu - shift,
            n: 0.0,
            ed: 0.0,
            en: 0.0,
            pr: 0.0,
            ..self.clone()
        }
    }

    /// Snapshot of the computed quantities.
    pub fn thermo(&self) -> Thermo {
        Thermo {
            n: self.n,
            ed: self.ed,
            en: self.en,
            pr: self.pr,
        }
    }
}

/// Number, energy and entropy densities and pressure.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Thermo {
    pub n: f64,
    pub ed: f64,
    pub en: f64,
    pub pr: f64,
}

/// A fermion, which also carries its Fermi momentum.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fermion {
    pub part: Particle,
    pub kf: f64,
}

impl Fermion {
    pub fn new(mass: f64, degeneracy: f64) -> Self {
        Self {
            part: Particle::new(mass, degeneracy),
            kf: 0.0,
        }
    }
}

impl Deref for Fermion {
    type Target = Particle;
    fn deref(&self) -> &Particle {
        &self.part
    }
}

impl DerefMut for Fermion {
    fn deref_mut(&mut self) -> &mut Particle {
        &mut self.part
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Boson {
    pub part: Particle,
}

impl Boson {
    pub fn new(mass: f64, degeneracy: f64) -> Self {
        Self {
            part: Particle::new(mass, degeneracy),
        }
    }

    pub fn anti(&self) -> Boson {
        Boson {
            part: self.part.anti(),
        }
    }
}

impl Deref for Boson {
    type Target = Particle;
    fn deref(&self) -> &Particle {
        &self.part
    }
}

impl DerefMut for Boson {
    fn deref_mut(&mut self) -> &mut Particle {
        &mut self.part
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_particle_is_free_with_rest_mass() {
        let p = Particle::new(4.76, 2.0);
        assert_eq!(p.ms, 4.76);
        assert!(p.non_interacting);
        assert!(p.inc_rest_mass);
        assert_eq!(p.rest_offset(), 0.0);
    }

    #[test]
    fn anti_negates_full_potentials() {
        let mut p = Particle::new(1.0, 1.0);
        p.mu = 0.7;
        p.nu = 0.6;
        let a = p.anti();
        assert_eq!((a.mu, a.nu), (-0.7, -0.6));

        p.inc_rest_mass = false;
        p.mu = -0.3;
        p.nu = -0.4;
        let a = p.anti();
        // full potentials are 0.7/0.6 → -0.7/-0.6, then shifted back by m
        assert!((a.nu_full() + 0.6).abs() < 1e-15);
        assert!((a.mu + a.m + 0.7).abs() < 1e-15);
    }

    #[test]
    fn kinetic_potential_follows_flag() {
        let mut p = Particle::new(2.0, 1.0);
        p.nu = 2.5;
        assert_eq!(p.nu_kinetic(), 0.5);
        p.inc_rest_mass = false;
        p.nu = 0.5;
        assert_eq!(p.nu_kinetic(), 0.5);
        assert_eq!(p.nu_full(), 2.5);
    }

    #[test]
    fn mass_checks() {
        let mut p = Particle::new(-1.0, 2.0);
        assert!(p.check_masses().is_err());
        p.m = 1.0;
        p.non_interacting = false;
        p.ms = -0.5;
        assert!(p.check_masses().is_err());
        p.ms = 0.5;
        assert!(p.check_masses().is_ok());
        p.g = 0.0;
        assert!(p.check_masses().is_err());
    }
}
