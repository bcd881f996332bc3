//! Error types for data loading.

use iporisk_model::RiskError;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading datasets and queries.
#[derive(Debug, Error)]
pub enum DataError {
    /// CSV reading error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A cell could not be parsed as a number
    #[error("Data parsing error: row {row}, column '{column}': '{value}' is not a number")]
    Parse {
        /// Data row index (0-based, header excluded)
        row: usize,
        /// Column name
        column: String,
        /// Raw cell contents
        value: String,
    },

    /// Schema or value problem in the loaded data
    #[error(transparent)]
    Model(#[from] RiskError),
}

impl DataError {
    /// The underlying model error, if this is a schema or value problem.
    pub const fn as_model(&self) -> Option<&RiskError> {
        match self {
            Self::Model(err) => Some(err),
            _ => None,
        }
    }
}
