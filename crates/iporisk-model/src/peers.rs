//! Peer selection and metric aggregation

use crate::dataset::ReferenceRow;
use crate::error::{Result, RiskError};
use crate::schema::RiskMetric;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default number of peers averaged per metric.
pub const DEFAULT_TOP_K: usize = 3;

/// A reference row chosen as a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerMatch {
    /// Position of the row in the reference dataset
    pub row_index: usize,
    /// Sub-sector label of the row
    pub subsector: String,
    /// Distance from the query
    pub distance: f64,
    /// Fuzzy similarity to the query
    pub similarity: f64,
    /// The row's precomputed value for the projected metric
    pub metric_value: f64,
}

/// Peers selected for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerSelection {
    /// Selected peers, most similar first
    pub peers: Vec<PeerMatch>,
    /// Whether the sub-sector had no rows and the whole dataset was used
    pub used_fallback: bool,
}

impl PeerSelection {
    /// Arithmetic mean of the peers' metric values.
    pub fn mean(&self) -> Option<f64> {
        if self.peers.is_empty() {
            return None;
        }
        let sum: f64 = self.peers.iter().map(|p| p.metric_value).sum();
        Some(sum / self.peers.len() as f64)
    }
}

/// Rank rows by similarity and keep the top `k`.
///
/// Only rows labeled `subsector` are candidates; if there are none, every
/// row is. Equal scores keep dataset order.
///
/// # Arguments
/// * `rows` - Reference rows
/// * `subsector` - Sub-sector label to filter on (exact match)
/// * `scores` - Similarity score per row, aligned with `rows`
/// * `distances` - Distance per row, aligned with `rows`
/// * `metric` - Metric whose values are reported
/// * `k` - Number of peers to keep
pub fn select_peers(
    rows: &[ReferenceRow],
    subsector: &str,
    scores: &[f64],
    distances: &[f64],
    metric: RiskMetric,
    k: usize,
) -> Result<PeerSelection> {
    if k == 0 {
        return Err(RiskError::InvalidConfig(
            "top_k must be at least 1".to_string(),
        ));
    }
    for len in [scores.len(), distances.len()] {
        if len != rows.len() {
            return Err(RiskError::DimensionMismatch {
                expected: rows.len(),
                actual: len,
            });
        }
    }

    let mut candidates: Vec<usize> = (0..rows.len())
        .filter(|&i| rows[i].subsector == subsector)
        .collect();
    let used_fallback = candidates.is_empty();
    if used_fallback {
        warn!(
            subsector,
            rows = rows.len(),
            "no reference rows in sub-sector, comparing against the full dataset"
        );
        candidates = (0..rows.len()).collect();
    }

    // Stable sort: ties stay in dataset order
    candidates.sort_by(|&i, &j| scores[j].total_cmp(&scores[i]));
    candidates.truncate(k);

    if candidates.is_empty() {
        return Err(RiskError::NoPeers {
            subsector: subsector.to_string(),
        });
    }

    let peers = candidates
        .into_iter()
        .map(|i| PeerMatch {
            row_index: i,
            subsector: rows[i].subsector.clone(),
            distance: distances[i],
            similarity: scores[i],
            metric_value: rows[i].metrics.get(metric),
        })
        .collect();

    Ok(PeerSelection {
        peers,
        used_fallback,
    })
}

/// Average `metric` over the `k` most similar peers in `subsector`.
///
/// # Errors
/// * [`RiskError::NoPeers`] if there are no reference rows at all
pub fn select_and_aggregate(
    rows: &[ReferenceRow],
    subsector: &str,
    scores: &[f64],
    metric: RiskMetric,
    k: usize,
) -> Result<f64> {
    let distances = vec![0.0; scores.len()];
    let selection = select_peers(rows, subsector, scores, &distances, metric, k)?;
    selection.mean().ok_or_else(|| RiskError::NoPeers {
        subsector: subsector.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeValues, MetricValues};
    use approx::assert_relative_eq;

    fn row(subsector: &str, std: f64) -> ReferenceRow {
        ReferenceRow::new(
            subsector,
            AttributeValues::default(),
            MetricValues {
                std,
                ..Default::default()
            },
        )
    }

    fn fixture() -> Vec<ReferenceRow> {
        vec![
            row("Banks", 0.10),
            row("Utilities", 0.90),
            row("Banks", 0.20),
            row("Banks", 0.30),
            row("Banks", 0.40),
        ]
    }

    #[test]
    fn test_top_k_within_subsector() {
        let rows = fixture();
        let scores = [0.2, 1.0, 0.9, 0.5, 0.0];

        let value =
            select_and_aggregate(&rows, "Banks", &scores, RiskMetric::Volatility, 3).unwrap();
        // Banks ranked: row 2 (0.9), row 3 (0.5), row 0 (0.2)
        assert_relative_eq!(value, (0.20 + 0.30 + 0.10) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ties_keep_dataset_order() {
        let rows = fixture();
        let scores = [0.0, 0.0, 0.0, 0.0, 0.0];
        let distances = [1.0; 5];

        let selection =
            select_peers(&rows, "Banks", &scores, &distances, RiskMetric::Volatility, 3).unwrap();
        let indices: Vec<usize> = selection.peers.iter().map(|p| p.row_index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
        assert!(!selection.used_fallback);
    }

    #[test]
    fn test_unknown_subsector_falls_back_to_all_rows() {
        let rows = fixture();
        let scores = [0.2, 1.0, 0.9, 0.5, 0.0];
        let distances = [0.0; 5];

        let selection =
            select_peers(&rows, "Telecommunication", &scores, &distances, RiskMetric::Volatility, 3)
                .unwrap();
        let indices: Vec<usize> = selection.peers.iter().map(|p| p.row_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(selection.used_fallback);
    }

    #[test]
    fn test_fewer_rows_than_k() {
        let rows = vec![row("Banks", 0.1), row("Banks", 0.5)];
        let value =
            select_and_aggregate(&rows, "Banks", &[1.0, 0.0], RiskMetric::Volatility, 3).unwrap();
        assert_relative_eq!(value, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_subsector_label_must_match_exactly() {
        let rows = vec![row("Food & Staples Retailing ", 0.1), row("Banks", 0.5)];
        let distances = [0.0; 2];

        let exact = select_peers(
            &rows,
            "Food & Staples Retailing ",
            &[0.0, 1.0],
            &distances,
            RiskMetric::Volatility,
            3,
        )
        .unwrap();
        assert_eq!(exact.peers.len(), 1);

        let trimmed = select_peers(
            &rows,
            "Food & Staples Retailing",
            &[0.0, 1.0],
            &distances,
            RiskMetric::Volatility,
            3,
        )
        .unwrap();
        assert!(trimmed.used_fallback);
        assert_eq!(trimmed.peers.len(), 2);
    }

    #[test]
    fn test_empty_dataset_has_no_peers() {
        let err = select_and_aggregate(&[], "Banks", &[], RiskMetric::Volatility, 3).unwrap_err();
        assert_eq!(
            err,
            RiskError::NoPeers {
                subsector: "Banks".to_string()
            }
        );
    }

    #[test]
    fn test_zero_k_rejected() {
        let rows = fixture();
        let err = select_and_aggregate(&rows, "Banks", &[0.0; 5], RiskMetric::Volatility, 0)
            .unwrap_err();
        assert!(matches!(err, RiskError::InvalidConfig(_)));
    }

    #[test]
    fn test_score_length_mismatch() {
        let rows = fixture();
        let err = select_and_aggregate(&rows, "Banks", &[0.0; 4], RiskMetric::Volatility, 3)
            .unwrap_err();
        assert!(matches!(err, RiskError::DimensionMismatch { expected: 5, actual: 4 }));
    }
}
