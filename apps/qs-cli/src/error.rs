//! Error types for the command-line driver.

use std::path::PathBuf;

use qs_interp::InterpError;
use qs_part::PartError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read input file: {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse input: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Thermodynamics error: {0}")]
    Part(#[from] PartError),

    #[error("Interpolation error: {0}")]
    Interp(#[from] InterpError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;

/// Read and parse a YAML file.
pub fn load_yaml<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> CliResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_yaml::from_str(&content)
        .map_err(|e| CliError::Parse(format!("{}: {}", path.display(), e)))
}
