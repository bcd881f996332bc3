//! Covariance models for peer distance
//!
//! The sample covariance of the reference rows defines the Mahalanobis
//! metric. When that matrix cannot be inverted the model degrades to a
//! diagonal metric built from per-attribute variances, and when an
//! attribute has no spread at all no metric can be built.

pub mod utils;

pub use utils::{EigenDecomposition, invert_symmetric, jacobi_eigendecomp};

use crate::error::{Result, RiskError};
use crate::schema::Attribute;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Covariance estimation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CovarianceConfig {
    /// Relative eigenvalue threshold below which the covariance matrix is
    /// treated as singular (default: 1e-12)
    pub singular_tolerance: f64,

    /// Variance at or below which an attribute has no spread (default: 1e-12)
    pub zero_variance_tolerance: f64,

    /// Maximum Jacobi rotations for the eigendecomposition (default: 100)
    pub max_iterations: usize,
}

impl Default for CovarianceConfig {
    fn default() -> Self {
        Self {
            singular_tolerance: 1e-12,
            zero_variance_tolerance: 1e-12,
            max_iterations: 500,
        }
    }
}

impl CovarianceConfig {
    /// Check that tolerances are finite and nonnegative and that at least
    /// one rotation is allowed.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(RiskError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("singular_tolerance", self.singular_tolerance),
            ("zero_variance_tolerance", self.zero_variance_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RiskError::InvalidConfig(format!(
                    "{name} must be finite and nonnegative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Which metric a [`CovarianceModel`] ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CovarianceKind {
    /// Inverse of the full sample covariance matrix
    Full,
    /// Reciprocal per-attribute variances
    Diagonal,
    /// No usable metric
    Degenerate,
}

/// Metric used to measure distance between attribute vectors.
#[derive(Debug, Clone, PartialEq)]
pub enum CovarianceModel {
    /// Inverse covariance matrix Σ⁻¹
    Full(Array2<f64>),
    /// Reciprocal variances, one per attribute
    Diagonal(Array1<f64>),
    /// Attributes with zero variance
    Degenerate(Vec<Attribute>),
}

impl CovarianceModel {
    /// Select a model for `observations` (rows x attributes).
    ///
    /// `attributes` names the columns of `observations`.
    pub fn fit(
        observations: &Array2<f64>,
        attributes: &[Attribute],
        config: &CovarianceConfig,
    ) -> Result<Self> {
        if observations.ncols() != attributes.len() {
            return Err(RiskError::DimensionMismatch {
                expected: attributes.len(),
                actual: observations.ncols(),
            });
        }

        let cov = sample_covariance(observations);
        let inverse = invert_symmetric(&cov, config.singular_tolerance, config.max_iterations)?;
        if let Some(inverse) = inverse {
            return Ok(Self::Full(inverse));
        }

        let variances = cov.diag().to_owned();
        let flat: Vec<Attribute> = attributes
            .iter()
            .zip(variances.iter())
            .filter(|&(_, &var)| var <= config.zero_variance_tolerance)
            .map(|(&attribute, _)| attribute)
            .collect();

        if flat.is_empty() {
            Ok(Self::Diagonal(variances.mapv(|v| 1.0 / v)))
        } else {
            Ok(Self::Degenerate(flat))
        }
    }

    /// Which variant this is.
    pub const fn kind(&self) -> CovarianceKind {
        match self {
            Self::Full(_) => CovarianceKind::Full,
            Self::Diagonal(_) => CovarianceKind::Diagonal,
            Self::Degenerate(_) => CovarianceKind::Degenerate,
        }
    }

    /// Squared Mahalanobis norm dᵀ Σ⁻¹ d of a difference vector.
    ///
    /// Rounding can push the quadratic form of a near-zero difference
    /// slightly below zero; such values are clamped to 0.
    pub fn squared_norm(&self, diff: ArrayView1<'_, f64>) -> Result<f64> {
        let value = match self {
            Self::Full(inverse) => {
                check_len(inverse.nrows(), diff.len())?;
                diff.dot(&inverse.dot(&diff))
            }
            Self::Diagonal(weights) => {
                check_len(weights.len(), diff.len())?;
                diff.iter().zip(weights.iter()).map(|(d, w)| d * d * w).sum()
            }
            Self::Degenerate(attributes) => {
                return Err(RiskError::DegenerateVariance {
                    attributes: attributes.clone(),
                });
            }
        };
        Ok(value.max(0.0))
    }
}

/// Sample covariance matrix (denominator n - 1)
///
/// Fewer than two observations carry no spread, so the result is all zeros.
pub fn sample_covariance(observations: &Array2<f64>) -> Array2<f64> {
    let (n_obs, n_attrs) = observations.dim();
    if n_obs < 2 {
        return Array2::zeros((n_attrs, n_attrs));
    }

    let Some(means) = observations.mean_axis(Axis(0)) else {
        return Array2::zeros((n_attrs, n_attrs));
    };
    let centered = observations - &means.insert_axis(Axis(0));

    centered.t().dot(&centered) / (n_obs as f64 - 1.0)
}

const fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(RiskError::DimensionMismatch { expected, actual })
    }
}
