//! Error types for integration.

use qs_core::QsError;
use thiserror::Error;

/// Errors raised before or during an integration.
///
/// Running out of subdivisions or evaluations is not an error: it is
/// reported through [`crate::IntegStatus`] alongside the best estimate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: String },

    #[error("Integrand returned {value} at x = {x}")]
    NonFinite { x: f64, value: f64 },
}

pub type IntegResult<T> = Result<T, IntegError>;

impl From<IntegError> for QsError {
    fn from(e: IntegError) -> Self {
        match e {
            IntegError::InvalidInput { what } => QsError::InvalidArg { what },
            IntegError::NonFinite { value, .. } => QsError::NonFinite {
                what: "integrand",
                value,
            },
        }
    }
}
