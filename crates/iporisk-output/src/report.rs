//! Human-readable reports for risk projections.

use chrono::{DateTime, Utc};
use iporisk_model::{PeerMatch, RiskMetric, RiskProjection};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal places used when none are configured.
pub const DEFAULT_PRECISION: usize = 4;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The builder was given no projection.
    #[error("Report has no projection")]
    MissingProjection,
}

/// One metric line of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    /// Metric being reported.
    pub metric: RiskMetric,

    /// Projected value, absent if the metric failed.
    pub value: Option<f64>,

    /// Failure reason, if the metric failed.
    pub failure: Option<String>,

    /// Peers behind the value, most similar first.
    pub peers: Vec<PeerMatch>,

    /// Whether peers were drawn from the full dataset.
    pub used_fallback: bool,
}

impl ReportLine {
    /// The value cell: the value to `precision` decimals or `n/a (<reason>)`.
    pub fn cell(&self, precision: usize) -> String {
        match (self.value, &self.failure) {
            (Some(value), _) => format!("{value:.precision$}"),
            (None, Some(reason)) => format!("n/a ({reason})"),
            (None, None) => "n/a".to_string(),
        }
    }
}

/// A report on one risk projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Queried sub-sector label.
    pub subsector: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Decimal places for values.
    pub precision: usize,

    /// Whether to list peers under the table.
    pub show_peers: bool,

    /// One line per metric, in metric order.
    pub lines: Vec<ReportLine>,
}

impl Report {
    /// Create a report from a projection.
    pub fn new(projection: &RiskProjection) -> Self {
        let lines = projection
            .iter()
            .map(|(metric, outcome)| match outcome {
                Ok(estimate) => ReportLine {
                    metric,
                    value: Some(estimate.value),
                    failure: None,
                    peers: estimate.peers.clone(),
                    used_fallback: estimate.used_fallback,
                },
                Err(err) => ReportLine {
                    metric,
                    value: None,
                    failure: Some(err.to_string()),
                    peers: Vec::new(),
                    used_fallback: false,
                },
            })
            .collect();

        Self {
            subsector: projection.subsector().to_string(),
            timestamp: Utc::now(),
            precision: DEFAULT_PRECISION,
            show_peers: false,
            lines,
        }
    }

    /// Whether any metric drew its peers from the full dataset.
    pub fn used_fallback(&self) -> bool {
        self.lines.iter().any(|l| l.used_fallback)
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as a plain-text table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nRisk Projection: {}\n", self.subsector));
        output.push_str(&format!(
            "Generated: {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&"=".repeat(60));
        output.push('\n');

        output.push_str(&format!("{:<20} {:<16} {:>12}\n", "Metric", "Column", "Value"));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        for line in &self.lines {
            output.push_str(&format!(
                "{:<20} {:<16} {:>12}\n",
                line.metric.label(),
                line.metric.name(),
                line.cell(self.precision)
            ));
        }

        output.push_str(&"=".repeat(60));
        output.push('\n');

        if self.used_fallback() {
            output.push_str(&format!(
                "Note: no reference rows in '{}'; peers drawn from the full dataset\n",
                self.subsector
            ));
        }

        if self.show_peers {
            for line in self.lines.iter().filter(|l| !l.peers.is_empty()) {
                output.push_str(&format!("\nPeers for {}:\n", line.metric.name()));
                output.push_str(&format!(
                    "  {:>5} {:<32} {:>10} {:>10} {:>10}\n",
                    "Row", "Sub-sector", "Distance", "Similarity", "Value"
                ));
                for peer in &line.peers {
                    output.push_str(&format!(
                        "  {:>5} {:<32} {:>10.prec$} {:>10.prec$} {:>10.prec$}\n",
                        peer.row_index,
                        peer.subsector,
                        peer.distance,
                        peer.similarity,
                        peer.metric_value,
                        prec = self.precision
                    ));
                }
            }
        }

        output
    }

    /// Render as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Risk Projection: {}\n\n", self.subsector));
        output.push_str(&format!(
            "**Generated:** {}\n\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        output.push_str("| Metric | Column | Value |\n");
        output.push_str("|--------|--------|-------|\n");
        for line in &self.lines {
            output.push_str(&format!(
                "| {} | `{}` | {} |\n",
                line.metric.label(),
                line.metric.name(),
                line.cell(self.precision)
            ));
        }

        if self.used_fallback() {
            output.push_str(&format!(
                "\n> No reference rows in '{}'; peers drawn from the full dataset.\n",
                self.subsector
            ));
        }

        if self.show_peers {
            output.push_str("\n## Peers\n");
            for line in self.lines.iter().filter(|l| !l.peers.is_empty()) {
                output.push_str(&format!("\n### {}\n\n", line.metric.name()));
                output.push_str("| Row | Sub-sector | Distance | Similarity | Value |\n");
                output.push_str("|-----|------------|----------|------------|-------|\n");
                for peer in &line.peers {
                    output.push_str(&format!(
                        "| {} | {} | {:.prec$} | {:.prec$} | {:.prec$} |\n",
                        peer.row_index,
                        peer.subsector,
                        peer.distance,
                        peer.similarity,
                        peer.metric_value,
                        prec = self.precision
                    ));
                }
            }
        }

        output
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder<'a> {
    projection: Option<&'a RiskProjection>,
    precision: Option<usize>,
    show_peers: bool,
    timestamp: Option<DateTime<Utc>>,
}

impl<'a> ReportBuilder<'a> {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the projection to report on.
    pub const fn projection(mut self, projection: &'a RiskProjection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Set the number of decimal places.
    pub const fn precision(mut self, precision: usize) -> Self {
        self.precision = Some(precision);
        self
    }

    /// List the peers behind each value.
    pub const fn show_peers(mut self, show: bool) -> Self {
        self.show_peers = show;
        self
    }

    /// Set the generation timestamp.
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        let projection = self.projection.ok_or(ReportError::MissingProjection)?;
        let mut report = Report::new(projection);
        report.precision = self.precision.unwrap_or(DEFAULT_PRECISION);
        report.show_peers = self.show_peers;
        if let Some(timestamp) = self.timestamp {
            report.timestamp = timestamp;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iporisk_model::{
        AttributeValues, MetricValues, QueryVector, ReferenceDataset, ReferenceRow, project_risk,
    };
    use std::sync::Arc;

    fn spread_row(subsector: &str, i: f64) -> ReferenceRow {
        ReferenceRow::new(
            subsector,
            AttributeValues {
                ipo_price: i,
                market_cap: (i * 1.3).sin(),
                roe: (i * 0.7).cos(),
                net_income: 0.2 * i * i - i,
                der: (i * 2.1).cos() + 0.3 * i,
                free_float: (i * 0.4).sin(),
            },
            MetricValues {
                std: 0.02 + 0.001 * i,
                dsd: 0.01 + 0.0005 * i,
                sharpe_ratio: 1.0 - 0.1 * i,
                sortino_ratio: 1.5 - 0.15 * i,
                liquidity_ratio: 0.003 + 0.0002 * i,
            },
        )
    }

    fn line(metric: RiskMetric, value: Option<f64>, failure: Option<&str>) -> ReportLine {
        ReportLine {
            metric,
            value,
            failure: failure.map(str::to_string),
            peers: Vec::new(),
            used_fallback: false,
        }
    }

    #[test]
    fn test_cell_formats_four_decimals() {
        let ok = line(RiskMetric::SharpeRatio, Some(0.966_666_6), None);
        assert_eq!(ok.cell(DEFAULT_PRECISION), "0.9667");
        assert_eq!(ok.cell(2), "0.97");

        let negative = line(RiskMetric::SortinoRatio, Some(-0.3), None);
        assert_eq!(negative.cell(4), "-0.3000");
    }

    #[test]
    fn test_cell_shows_failure_reason() {
        let failed = line(
            RiskMetric::DownsideDeviation,
            None,
            Some("Degenerate variance: no spread in free_float"),
        );
        assert_eq!(
            failed.cell(4),
            "n/a (Degenerate variance: no spread in free_float)"
        );
    }

    #[test]
    fn test_to_json_carries_every_line() {
        let rows = (0..8).map(|i| spread_row("Banks", i as f64)).collect();
        let dataset = Arc::new(ReferenceDataset::new(rows).unwrap());
        let query = QueryVector::new("Banks", spread_row("Banks", 2.5).attributes).unwrap();
        let projection = project_risk(&query, dataset).unwrap();

        let report = ReportBuilder::new()
            .projection(&projection)
            .precision(2)
            .build()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["subsector"], "Banks");
        assert_eq!(json["precision"], 2);
        let lines = json["lines"].as_array().unwrap();
        assert_eq!(lines.len(), RiskMetric::ALL.len());
        assert_eq!(lines[0]["peers"].as_array().unwrap().len(), 3);
        assert!(lines[0]["failure"].is_null());

        let parsed: Report = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed.lines, report.lines);
    }

    #[test]
    fn test_builder_requires_projection() {
        let err = ReportBuilder::new().precision(2).build().unwrap_err();
        assert!(matches!(err, ReportError::MissingProjection));
    }
}
