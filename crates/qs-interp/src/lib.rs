//! One-dimensional interpolation by Gaussian-process (Kriging) regression.
//!
//! [`KrigeInterp`] takes any [`Covariance`]; [`KrigeOptim`] fits the length
//! scale of a squared-exponential covariance to the data.

pub mod covariance;
pub mod error;
pub mod krige;
pub mod optim;

pub use covariance::{CovarFn, Covariance, SquaredExp};
pub use error::{InterpError, InterpResult};
pub use krige::{Interpolator, KrigeInterp, MatrixMode};
pub use optim::{KrigeConfig, KrigeOptim, QualityMode};
