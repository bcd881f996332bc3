//! Integration tests for reports and export of real projections.

use chrono::{TimeZone, Utc};
use iporisk_model::{
    AttributeValues, MetricValues, QueryVector, ReferenceDataset, ReferenceRow, RiskProjection,
    project_risk,
};
use iporisk_output::{ExportFormat, Exporter, MetricOutcome, ProjectionExport, ReportBuilder};
use rstest::rstest;
use std::sync::Arc;

fn row(subsector: &str, i: f64) -> ReferenceRow {
    ReferenceRow::new(
        subsector,
        AttributeValues {
            ipo_price: i,
            market_cap: (i * 1.3).sin(),
            roe: (i * 0.7).cos(),
            net_income: 0.2 * i * i - i,
            der: (i * 2.1).cos() + 0.3 * i,
            free_float: 0.5,
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

/// Six rows with a constant free_float, so only the metrics matched on
/// free_float fail.
fn projection(subsector: &str) -> RiskProjection {
    let rows = (0..6)
        .map(|i| row(if i < 4 { "Banks" } else { "Utilities" }, i as f64))
        .collect();
    let dataset = Arc::new(ReferenceDataset::new(rows).unwrap());
    let query = QueryVector::new(subsector, row("Banks", 1.5).attributes).unwrap();
    project_risk(&query, dataset).unwrap()
}

#[test]
fn test_ascii_report_for_partial_projection() {
    let projection = projection("Banks");
    let report = ReportBuilder::new()
        .projection(&projection)
        .show_peers(true)
        .timestamp(Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap())
        .build()
        .unwrap();

    let ascii = report.to_ascii_table();
    assert!(ascii.contains("Risk Projection: Banks"));
    assert!(ascii.contains("Generated: 2024-05-02 08:00:00 UTC"));
    assert!(ascii.contains("Sharpe Ratio"));
    assert!(ascii.contains("n/a (Degenerate variance: no spread in free_float)"));
    assert!(ascii.contains("Peers for sharpe_ratio:"));
    assert!(!ascii.contains("Peers for dsd:"));
    assert!(!ascii.contains("NaN"));
    assert!(!ascii.contains("Note:"));

    let sharpe = projection
        .value(iporisk_model::RiskMetric::SharpeRatio)
        .unwrap();
    assert!(ascii.contains(&format!("{sharpe:.4}")));
}

#[test]
fn test_markdown_report() {
    let projection = projection("Banks");
    let report = ReportBuilder::new()
        .projection(&projection)
        .build()
        .unwrap();

    let markdown = report.to_markdown();
    assert!(markdown.starts_with("# Risk Projection: Banks\n"));
    assert!(markdown.contains("| Metric | Column | Value |"));
    assert!(markdown.contains("| Liquidity Ratio | `liquidity_ratio` | n/a ("));
    assert!(!markdown.contains("## Peers"));
}

#[test]
fn test_fallback_is_noted() {
    let projection = projection("Telecommunication");
    let report = ReportBuilder::new()
        .projection(&projection)
        .build()
        .unwrap();

    assert!(report.used_fallback());
    assert!(report.to_ascii_table().contains(
        "Note: no reference rows in 'Telecommunication'; peers drawn from the full dataset"
    ));
}

#[test]
fn test_export_marks_failed_metrics() {
    let projection = projection("Banks");
    let export = ProjectionExport::from_projection(&projection);

    assert_eq!(export.metrics.len(), 5);
    assert!(matches!(
        &export.metrics["dsd"],
        MetricOutcome::Failed { kind, .. } if kind == "degenerate_variance"
    ));
    assert!(matches!(
        &export.metrics["std"],
        MetricOutcome::Ok { peers, .. } if peers.len() == 3
    ));

    let json: serde_json::Value =
        serde_json::from_str(&export.export_to_string(ExportFormat::Json).unwrap()).unwrap();
    assert_eq!(json["metrics"]["liquidity_ratio"]["status"], "failed");
    assert_eq!(json["metrics"]["sharpe_ratio"]["status"], "ok");
}

#[rstest]
#[case(ExportFormat::Csv)]
#[case(ExportFormat::Json)]
#[case(ExportFormat::PrettyJson)]
fn test_every_format_exports(#[case] format: ExportFormat) {
    let export = ProjectionExport::from_projection(&projection("Banks"));
    let content = export.export_to_string(format).unwrap();

    assert!(content.contains("Banks"));
    assert!(content.contains("sharpe_ratio"));
    assert!(content.contains("failed"));
}
