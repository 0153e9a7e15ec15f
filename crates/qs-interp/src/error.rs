//! Error types for interpolation.

use qs_core::QsError;
use thiserror::Error;

use crate::krige::MatrixMode;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: String },

    #[error("Covariance matrix is singular ({mode:?} decomposition)")]
    Singular { mode: MatrixMode },

    #[error("Covariance does not provide {what}")]
    Unsupported { what: &'static str },

    #[error("No length scale in [{len_min}, {len_max}] gave a usable covariance matrix")]
    NoLengthScale { len_min: f64, len_max: f64 },
}

pub type InterpResult<T> = Result<T, InterpError>;

impl From<InterpError> for QsError {
    fn from(e: InterpError) -> Self {
        match e {
            InterpError::InvalidInput { what } => QsError::InvalidArg { what },
            InterpError::Unsupported { .. } => QsError::InvalidArg {
                what: e.to_string(),
            },
            InterpError::Singular { .. } | InterpError::NoLengthScale { .. } => {
                QsError::Convergence {
                    what: e.to_string(),
                }
            }
        }
    }
}
