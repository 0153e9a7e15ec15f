//! One-dimensional root finding.
//!
//! [`RootSolver`] is the strategy the particle engines borrow to invert
//! density ↔ chemical potential. [`NewtonSolver`] is the derivative-free
//! primary solver; [`BrentSolver`] the bracketing fallback.

pub mod bracket;
pub mod brent;
pub mod error;
pub mod newton;
pub mod solver;

pub use bracket::{BracketSearch, expand_bracket};
pub use brent::{BrentConfig, BrentSolver};
pub use error::{RootError, RootResult};
pub use newton::{NewtonConfig, NewtonSolver};
pub use solver::{BracketingSolver, Convergence, RootSolver};
