//! Error types for risk projection.

use crate::schema::Attribute;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for risk projection operations.
pub type Result<T> = std::result::Result<T, RiskError>;

/// Where a schema problem was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaOrigin {
    /// The caller-supplied query record.
    Query,
    /// The reference dataset.
    Dataset,
}

impl fmt::Display for SchemaOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Dataset => write!(f, "reference dataset"),
        }
    }
}

/// Errors that can occur during risk projection.
///
/// [`RiskError::DegenerateVariance`] and [`RiskError::NoPeers`] are
/// statistical degeneracies scoped to a single metric. Every other variant
/// is fatal for the whole projection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// Covariance is singular and at least one attribute has zero variance
    #[error("Degenerate variance: no spread in {}", join_attributes(.attributes))]
    DegenerateVariance {
        /// Attributes with zero variance across the reference rows
        attributes: Vec<Attribute>,
    },

    /// No reference rows to average over
    #[error("No peers available for sub-sector '{subsector}'")]
    NoPeers {
        /// Sub-sector label that was queried
        subsector: String,
    },

    /// A required attribute or column is missing
    #[error("Schema mismatch: {origin} is missing '{field}'")]
    SchemaMismatch {
        /// Name of the missing field
        field: String,
        /// Which input is missing it
        origin: SchemaOrigin,
    },

    /// A numeric input is NaN or infinite
    #[error("Invalid value for {field}: {value} (must be finite)")]
    InvalidValue {
        /// Field that carried the value
        field: String,
        /// Offending value
        value: f64,
    },

    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The eigendecomposition did not converge within the rotation budget
    #[error("No convergence after {iterations} Jacobi rotations")]
    NoConvergence {
        /// Rotations performed
        iterations: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },
}

impl RiskError {
    /// Whether this error aborts the whole projection rather than one metric.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::DegenerateVariance { .. } | Self::NoPeers { .. })
    }

    /// Short machine-readable tag for the error kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DegenerateVariance { .. } => "degenerate_variance",
            Self::NoPeers { .. } => "no_peers",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::InvalidValue { .. } => "invalid_value",
            Self::InvalidConfig(_) => "invalid_config",
            Self::NoConvergence { .. } => "no_convergence",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
        }
    }
}

fn join_attributes(attributes: &[Attribute]) -> String {
    attributes
        .iter()
        .map(|a| a.name())
        .collect::<Vec<_>>()
        .join(", ")
}
