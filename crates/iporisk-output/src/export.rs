//! Export of risk projections.
//!
//! JSON keeps the full per-metric outcome, including the peers behind each
//! value. CSV writes one row per metric.

use chrono::{DateTime, Utc};
use iporisk_model::{CovarianceKind, PeerMatch, RiskProjection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output was not valid UTF-8.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Outcome of one metric, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricOutcome {
    /// The metric was projected.
    Ok {
        /// Mean of the peers' metric values.
        value: f64,
        /// Covariance model behind the distances.
        covariance: CovarianceKind,
        /// Whether peers were drawn from the full dataset.
        used_fallback: bool,
        /// Peers, most similar first.
        peers: Vec<PeerMatch>,
    },

    /// The metric could not be projected.
    Failed {
        /// Error tag, e.g. `degenerate_variance`.
        kind: String,
        /// Error message.
        error: String,
    },
}

impl MetricOutcome {
    /// The projected value, if any.
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Ok { value, .. } => Some(*value),
            Self::Failed { .. } => None,
        }
    }
}

/// A risk projection ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionExport {
    /// Queried sub-sector label.
    pub subsector: String,

    /// Export generation timestamp.
    pub generated_at: DateTime<Utc>,

    /// Outcome keyed by metric name.
    pub metrics: BTreeMap<String, MetricOutcome>,
}

impl ProjectionExport {
    /// Convert a projection, stamped with the current time.
    pub fn from_projection(projection: &RiskProjection) -> Self {
        Self::with_timestamp(projection, Utc::now())
    }

    /// Convert a projection with an explicit timestamp.
    pub fn with_timestamp(projection: &RiskProjection, generated_at: DateTime<Utc>) -> Self {
        let metrics = projection
            .iter()
            .map(|(metric, outcome)| {
                let outcome = match outcome {
                    Ok(estimate) => MetricOutcome::Ok {
                        value: estimate.value,
                        covariance: estimate.covariance,
                        used_fallback: estimate.used_fallback,
                        peers: estimate.peers.clone(),
                    },
                    Err(err) => MetricOutcome::Failed {
                        kind: err.kind().to_string(),
                        error: err.to_string(),
                    },
                };
                (metric.name().to_string(), outcome)
            })
            .collect();

        Self {
            subsector: projection.subsector().to_string(),
            generated_at,
            metrics,
        }
    }

    fn to_flat_records(&self) -> Vec<MetricRecord> {
        self.metrics
            .iter()
            .map(|(metric, outcome)| match outcome {
                MetricOutcome::Ok {
                    value,
                    used_fallback,
                    peers,
                    ..
                } => MetricRecord {
                    subsector: self.subsector.clone(),
                    metric: metric.clone(),
                    status: "ok",
                    value: Some(*value),
                    peers: peers.len(),
                    used_fallback: Some(*used_fallback),
                    error: None,
                },
                MetricOutcome::Failed { error, .. } => MetricRecord {
                    subsector: self.subsector.clone(),
                    metric: metric.clone(),
                    status: "failed",
                    value: None,
                    peers: 0,
                    used_fallback: None,
                    error: Some(error.clone()),
                },
            })
            .collect()
    }
}

/// Flattened metric outcome for CSV export.
#[derive(Debug, Serialize)]
struct MetricRecord {
    subsector: String,
    metric: String,
    status: &'static str,
    value: Option<f64>,
    peers: usize,
    used_fallback: Option<bool>,
    error: Option<String>,
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_string<T: Serialize>(records: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for ProjectionExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self.to_flat_records()),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<ProjectionExport> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self.iter().flat_map(ProjectionExport::to_flat_records)),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
