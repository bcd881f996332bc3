//! Risk projection
//!
//! Runs the distance, similarity and peer-selection stages once per risk
//! metric, each on that metric's own attribute subset, and collects the
//! averaged peer values into a [`RiskProjection`].
//!
//! Metric failures caused by the data ([`RiskError::DegenerateVariance`],
//! [`RiskError::NoPeers`]) are kept in that metric's slot so the remaining
//! metrics are still reported. Schema, value and configuration errors abort
//! the projection.

use crate::covariance::{CovarianceConfig, CovarianceKind};
use crate::dataset::{QueryVector, ReferenceDataset};
use crate::distance::compute_distances;
use crate::error::{Result, RiskError};
use crate::fuzzy::{MembershipMode, to_similarity};
use crate::peers::{DEFAULT_TOP_K, PeerMatch, select_peers};
use crate::schema::RiskMetric;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Risk projection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Number of peers averaged per metric (default: 3)
    pub top_k: usize,

    /// Membership evaluation mode (default: closed form)
    pub membership: MembershipMode,

    /// Covariance estimation settings
    pub covariance: CovarianceConfig,

    /// Evaluate metrics on the rayon thread pool (default: false)
    pub parallel: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            membership: MembershipMode::ClosedForm,
            covariance: CovarianceConfig::default(),
            parallel: false,
        }
    }
}

impl ProjectionConfig {
    /// Check every parameter.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RiskError::InvalidConfig(
                "top_k must be at least 1".to_string(),
            ));
        }
        self.membership.validate()?;
        self.covariance.validate()
    }
}

/// Projected value for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEstimate {
    /// Metric that was projected
    pub metric: RiskMetric,
    /// Mean of the peers' metric values
    pub value: f64,
    /// Peers the mean was taken over, most similar first
    pub peers: Vec<PeerMatch>,
    /// Covariance model used for the distances
    pub covariance: CovarianceKind,
    /// Whether the query's sub-sector had no rows and the whole dataset was used
    pub used_fallback: bool,
}

/// Result mapping from metric to outcome.
///
/// Always holds an entry for every [`RiskMetric`].
#[derive(Debug, Clone, PartialEq)]
pub struct RiskProjection {
    subsector: String,
    outcomes: BTreeMap<RiskMetric, Result<MetricEstimate>>,
}

impl RiskProjection {
    /// Sub-sector label the projection was made for.
    pub fn subsector(&self) -> &str {
        &self.subsector
    }

    /// Outcome for a metric.
    pub fn get(&self, metric: RiskMetric) -> Option<&Result<MetricEstimate>> {
        self.outcomes.get(&metric)
    }

    /// Projected value for a metric, or `None` if that metric failed.
    pub fn value(&self, metric: RiskMetric) -> Option<f64> {
        match self.outcomes.get(&metric) {
            Some(Ok(estimate)) => Some(estimate.value),
            _ => None,
        }
    }

    /// Outcomes in metric order.
    pub fn iter(&self) -> impl Iterator<Item = (RiskMetric, &Result<MetricEstimate>)> {
        self.outcomes.iter().map(|(&m, r)| (m, r))
    }

    /// Successfully projected values keyed by metric name.
    pub fn values(&self) -> BTreeMap<&'static str, f64> {
        self.outcomes
            .iter()
            .filter_map(|(m, r)| r.as_ref().ok().map(|e| (m.name(), e.value)))
            .collect()
    }

    /// Metrics that failed, with their errors.
    pub fn failures(&self) -> Vec<(RiskMetric, &RiskError)> {
        self.outcomes
            .iter()
            .filter_map(|(&m, r)| r.as_ref().err().map(|e| (m, e)))
            .collect()
    }

    /// Whether every metric was projected.
    pub fn is_complete(&self) -> bool {
        self.outcomes.values().all(|r| r.is_ok())
    }
}

/// Projects risk metrics for new listings against a fixed reference dataset.
#[derive(Debug, Clone)]
pub struct RiskProjector {
    dataset: Arc<ReferenceDataset>,
    config: ProjectionConfig,
}

impl RiskProjector {
    /// Create a projector over `dataset`.
    pub fn new(dataset: Arc<ReferenceDataset>, config: ProjectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { dataset, config })
    }

    /// The reference dataset.
    pub fn dataset(&self) -> &ReferenceDataset {
        &self.dataset
    }

    /// The active configuration.
    pub const fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Project every metric for `query`.
    ///
    /// # Errors
    /// Only fatal errors are returned here; per-metric failures are stored
    /// in the returned [`RiskProjection`].
    pub fn project(&self, query: &QueryVector) -> Result<RiskProjection> {
        query.attributes.validate("query ")?;

        let run = |metric: RiskMetric| (metric, self.estimate(query, metric));
        let results: Vec<(RiskMetric, Result<MetricEstimate>)> = if self.config.parallel {
            RiskMetric::ALL.par_iter().map(|&m| run(m)).collect()
        } else {
            RiskMetric::ALL.iter().map(|&m| run(m)).collect()
        };

        let mut outcomes = BTreeMap::new();
        for (metric, result) in results {
            match result {
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    info!(%metric, error = %err, "metric could not be projected");
                    outcomes.insert(metric, Err(err));
                }
                Ok(estimate) => {
                    outcomes.insert(metric, Ok(estimate));
                }
            }
        }

        Ok(RiskProjection {
            subsector: query.subsector.clone(),
            outcomes,
        })
    }

    /// Project a single metric for `query`.
    pub fn project_metric(&self, query: &QueryVector, metric: RiskMetric) -> Result<MetricEstimate> {
        query.attributes.validate("query ")?;
        self.estimate(query, metric)
    }

    fn estimate(&self, query: &QueryVector, metric: RiskMetric) -> Result<MetricEstimate> {
        let rows = self.dataset.rows();
        let attributes = metric.attributes();

        let distances = compute_distances(
            &query.select(attributes),
            rows,
            attributes,
            &query.subsector,
            &self.config.covariance,
        )?;
        let scores = to_similarity(&distances.values, self.config.membership)?;
        let selection = select_peers(
            rows,
            &query.subsector,
            &scores,
            &distances.values,
            metric,
            self.config.top_k,
        )?;

        let value = selection.mean().ok_or_else(|| RiskError::NoPeers {
            subsector: query.subsector.clone(),
        })?;

        debug!(
            %metric,
            value,
            peers = selection.peers.len(),
            fallback = selection.used_fallback,
            "projected metric"
        );

        Ok(MetricEstimate {
            metric,
            value,
            peers: selection.peers,
            covariance: distances.kind,
            used_fallback: selection.used_fallback,
        })
    }
}

/// Project every metric for `query` against `dataset` with the default
/// configuration.
pub fn project_risk(query: &QueryVector, dataset: Arc<ReferenceDataset>) -> Result<RiskProjection> {
    RiskProjector::new(dataset, ProjectionConfig::default())?.project(query)
}
