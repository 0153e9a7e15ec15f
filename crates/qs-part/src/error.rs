//! Error types for the thermodynamics engines.

use qs_core::QsError;
use qs_inte::IntegError;
use qs_root::RootError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PartError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: String },

    #[error("Non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Density inversion failed ({diagnostics})")]
    InversionFailed { diagnostics: String },

    #[error(transparent)]
    Integ(#[from] IntegError),

    #[error(transparent)]
    Root(#[from] RootError),
}

pub type PartResult<T> = Result<T, PartError>;

impl PartError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        PartError::InvalidInput { what: what.into() }
    }
}

impl From<QsError> for PartError {
    fn from(e: QsError) -> Self {
        match e {
            QsError::NonFinite { what, value } => PartError::NonFinite { what, value },
            QsError::InvalidArg { what } => PartError::InvalidInput { what },
            QsError::Convergence { what } => PartError::InversionFailed { diagnostics: what },
        }
    }
}

impl From<PartError> for QsError {
    fn from(e: PartError) -> Self {
        match e {
            PartError::InvalidInput { what } => QsError::InvalidArg { what },
            PartError::NonFinite { what, value } => QsError::NonFinite { what, value },
            PartError::InversionFailed { diagnostics } => QsError::Convergence { what: diagnostics },
            PartError::Integ(e) => e.into(),
            PartError::Root(e) => e.into(),
        }
    }
}
