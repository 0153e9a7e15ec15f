use thiserror::Error;

pub type QsResult<T> = Result<T, QsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QsError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Failed to converge: {what}")]
    Convergence { what: String },
}
