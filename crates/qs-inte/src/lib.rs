//! Numerical integration for the statistics engines.
//!
//! Two families live here:
//! - one-dimensional adaptive rules behind the [`Integrator`] trait
//!   ([`AdaptiveIntegrator`], [`GaussCern`]), which the particle engines
//!   borrow as replaceable strategies;
//! - multidimensional adaptive cubature ([`HCubature`], [`PCubature`]) for
//!   vector-valued integrands, with an optional rayon-parallel batch mode.

pub mod adaptive;
pub mod cubature;
pub mod error;
pub mod gauss_cern;
pub mod integrator;

pub use adaptive::{AdaptiveConfig, AdaptiveIntegrator};
pub use cubature::{
    Cubature, CubatureConfig, CubatureOutcome, ErrorNorm, HCubature, PCubature, VectorIntegrand,
};
pub use error::{IntegError, IntegResult};
pub use gauss_cern::{GaussCern, GaussConfig};
pub use integrator::{Estimate, IntegStatus, Integrator, Subdivision};
