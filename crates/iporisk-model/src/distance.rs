//! Mahalanobis distance from a query to each reference row
//!
//! d(x, y) = sqrt((x - y)ᵀ Σ⁻¹ (x - y))
//!
//! where Σ is the sample covariance of the reference rows restricted to the
//! chosen attributes (or its diagonal fallback, see [`CovarianceModel`]).

use crate::covariance::{CovarianceConfig, CovarianceKind, CovarianceModel};
use crate::dataset::{ReferenceRow, attribute_matrix, require_attributes};
use crate::error::{Result, RiskError};
use crate::schema::Attribute;
use ndarray::Array1;
use tracing::{debug, warn};

/// Distances for one attribute subset, in reference row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Distances {
    /// One nonnegative distance per reference row
    pub values: Vec<f64>,
    /// Covariance model the distances were measured with
    pub kind: CovarianceKind,
}

/// Compute the distance from `query` to every row in `rows`.
///
/// # Arguments
/// * `query` - Query values, aligned with `attributes`
/// * `rows` - Reference rows
/// * `attributes` - Attribute subset to measure on
/// * `subsector` - Label reported if `rows` is empty
///
/// # Errors
/// * [`RiskError::NoPeers`] if `rows` is empty
/// * [`RiskError::DegenerateVariance`] if the covariance is singular and an
///   attribute has no spread
pub fn compute_distances(
    query: &[f64],
    rows: &[ReferenceRow],
    attributes: &[Attribute],
    subsector: &str,
    config: &CovarianceConfig,
) -> Result<Distances> {
    require_attributes(attributes)?;
    if query.len() != attributes.len() {
        return Err(RiskError::DimensionMismatch {
            expected: attributes.len(),
            actual: query.len(),
        });
    }
    if rows.is_empty() {
        return Err(RiskError::NoPeers {
            subsector: subsector.to_string(),
        });
    }

    let observations = attribute_matrix(rows, attributes);
    let model = CovarianceModel::fit(&observations, attributes, config)?;

    match &model {
        CovarianceModel::Full(_) => {}
        CovarianceModel::Diagonal(_) => warn!(
            ?attributes,
            rows = rows.len(),
            "covariance matrix is singular, falling back to per-attribute variances"
        ),
        CovarianceModel::Degenerate(flat) => {
            return Err(RiskError::DegenerateVariance {
                attributes: flat.clone(),
            });
        }
    }

    let query = Array1::from_vec(query.to_vec());
    let values = observations
        .rows()
        .into_iter()
        .map(|row| {
            let diff = &query - &row;
            model.squared_norm(diff.view()).map(f64::sqrt)
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(?attributes, kind = ?model.kind(), rows = values.len(), "computed distances");

    Ok(Distances {
        values,
        kind: model.kind(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeValues, MetricValues};
    use approx::assert_relative_eq;

    const PAIR: [Attribute; 2] = [Attribute::Der, Attribute::NetIncome];

    fn row(der: f64, net_income: f64) -> ReferenceRow {
        ReferenceRow::new(
            "Banks",
            AttributeValues {
                der,
                net_income,
                ..Default::default()
            },
            MetricValues::default(),
        )
    }

    fn distances(query: &[f64], rows: &[ReferenceRow]) -> Result<Distances> {
        compute_distances(query, rows, &PAIR, "Banks", &CovarianceConfig::default())
    }

    #[test]
    fn test_zero_distance_for_identical_vector() {
        let rows = vec![row(0.0, 0.0), row(1.0, 2.0), row(2.0, 1.0), row(3.0, 3.5)];
        let result = distances(&[1.0, 2.0], &rows).unwrap();

        assert_eq!(result.kind, CovarianceKind::Full);
        assert_eq!(result.values.len(), 4);
        assert_relative_eq!(result.values[1], 0.0, epsilon = 1e-9);
        for (i, &d) in result.values.iter().enumerate() {
            assert!(d >= 0.0);
            if i != 1 {
                assert!(d > 1e-6);
            }
        }
    }

    #[test]
    fn test_uncorrelated_attributes_scale_by_variance() {
        // der ∈ {-1, 1} twice (var 4/3), net_income ∈ {-2, 2} (var 16/3), zero covariance
        let rows = vec![row(-1.0, -2.0), row(-1.0, 2.0), row(1.0, -2.0), row(1.0, 2.0)];
        let result = distances(&[0.0, 0.0], &rows).unwrap();

        // d² = 1/(4/3) + 4/(16/3) = 3/4 + 3/4
        let expected = 1.5_f64.sqrt();
        for &d in &result.values {
            assert_relative_eq!(d, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_collinear_rows_use_diagonal_fallback() {
        let rows = vec![row(1.0, 2.0), row(2.0, 4.0), row(3.0, 6.0)];
        let result = distances(&[2.0, 4.0], &rows).unwrap();

        assert_eq!(result.kind, CovarianceKind::Diagonal);
        // var(der) = 1, var(net_income) = 4; row 0 differs by (1, 2)
        assert_relative_eq!(result.values[0], 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(result.values[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_variance_is_degenerate() {
        let rows = vec![row(1.0, 5.0), row(2.0, 5.0), row(3.0, 5.0)];
        let err = distances(&[2.0, 5.0], &rows).unwrap_err();
        assert_eq!(
            err,
            RiskError::DegenerateVariance {
                attributes: vec![Attribute::NetIncome]
            }
        );
    }

    #[test]
    fn test_single_row_is_degenerate() {
        let rows = vec![row(1.0, 5.0)];
        let err = distances(&[1.0, 5.0], &rows).unwrap_err();
        assert_eq!(
            err,
            RiskError::DegenerateVariance {
                attributes: PAIR.to_vec()
            }
        );
    }

    #[test]
    fn test_empty_rows() {
        let err = distances(&[0.0, 0.0], &[]).unwrap_err();
        assert_eq!(
            err,
            RiskError::NoPeers {
                subsector: "Banks".to_string()
            }
        );
    }

    #[test]
    fn test_empty_attribute_subset() {
        let rows = vec![row(1.0, 5.0), row(2.0, 6.0)];
        let err =
            compute_distances(&[], &rows, &[], "Banks", &CovarianceConfig::default()).unwrap_err();
        assert!(matches!(err, RiskError::InvalidConfig(_)));
    }
}
