//! Error types for root finding.

use qs_core::QsError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RootError {
    #[error("No convergence after {iterations} iterations, residual = {residual}")]
    NonConvergence { iterations: usize, residual: f64 },

    #[error("Root not bracketed: f({lo}) = {f_lo}, f({hi}) = {f_hi}")]
    NotBracketed {
        lo: f64,
        hi: f64,
        f_lo: f64,
        f_hi: f64,
    },

    #[error("Residual is non-finite at x = {x}")]
    NonFinite { x: f64 },

    #[error("Invalid input: {what}")]
    InvalidInput { what: String },
}

pub type RootResult<T> = Result<T, RootError>;

impl From<RootError> for QsError {
    fn from(e: RootError) -> Self {
        match e {
            RootError::NonConvergence { .. } | RootError::NotBracketed { .. } => {
                QsError::Convergence {
                    what: e.to_string(),
                }
            }
            RootError::NonFinite { x } => QsError::NonFinite {
                what: "root residual",
                value: x,
            },
            RootError::InvalidInput { what } => QsError::InvalidArg { what },
        }
    }
}
