//! Finite-temperature thermodynamics of ideal quantum gases.
//!
//! Particle state lives in [`Particle`] ([`Fermion`], [`Boson`]); the
//! engines mutate it:
//!
//! - [`FermionNonrel`]: nonrelativistic fermions through complete
//!   Fermi–Dirac integrals, with a closed form at zero temperature;
//! - [`BosonRel`]: relativistic bosons by adaptive integration, with
//!   degenerate and non-degenerate regimes and particle–antiparticle pairs;
//! - [`ClassicalThermo`]: the Maxwell–Boltzmann limit, also used to reseed
//!   failed density inversions.
//!
//! `calc_mu` computes densities from chemical potentials; `calc_density`
//! inverts for the chemical potential at a target number density.

pub mod boson_rel;
pub mod classical;
pub mod error;
pub mod fermion_nonrel;
mod inversion;
pub mod particle;

pub use boson_rel::{BoseIntegrands, BosonRel, Regime};
pub use classical::ClassicalThermo;
pub use error::{PartError, PartResult};
pub use fermion_nonrel::FermionNonrel;
pub use inversion::InversionStage;
pub use particle::{Boson, Fermion, Particle, Thermo};
