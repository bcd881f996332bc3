//! Reference dataset loading from CSV.
//!
//! Header names are matched after trimming surrounding whitespace. Cell
//! values for the sub-sector column are kept verbatim, so labels such as
//! `"Food & Staples Retailing "` survive with their trailing space.

use crate::error::{DataError, Result};
use iporisk_model::{
    Attribute, AttributeValues, MetricValues, ReferenceDataset, ReferenceRow, RiskError,
    RiskMetric, SchemaOrigin,
};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Header of the sub-sector label column.
pub const SUBSECTOR_COLUMN: &str = "Sub Sektor";

/// Column positions of every required field.
#[derive(Debug)]
struct ColumnMap {
    subsector: usize,
    attributes: Vec<(Attribute, usize)>,
    metrics: Vec<(RiskMetric, usize)>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| RiskError::SchemaMismatch {
                    field: name.to_string(),
                    origin: SchemaOrigin::Dataset,
                })
        };

        let subsector = find(SUBSECTOR_COLUMN)?;
        let attributes = Attribute::ALL
            .iter()
            .map(|&a| find(a.name()).map(|i| (a, i)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let metrics = RiskMetric::ALL
            .iter()
            .map(|&m| find(m.name()).map(|i| (m, i)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            subsector,
            attributes,
            metrics,
        })
    }
}

fn parse_cell(record: &csv::StringRecord, index: usize, row: usize, column: &str) -> Result<f64> {
    let raw = record.get(index).unwrap_or("");
    raw.trim().parse::<f64>().map_err(|_| DataError::Parse {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Read a reference dataset from any CSV source.
///
/// # Errors
/// * [`RiskError::SchemaMismatch`] if a required column is missing
/// * [`DataError::Parse`] if a cell is not a number
/// * [`RiskError::InvalidValue`] if a value is NaN or infinite
pub fn read_reference<R: Read>(reader: R) -> Result<ReferenceDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(reader.headers()?)?;
    debug!(?columns, "resolved reference columns");

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;

        let mut attributes = AttributeValues::default();
        for &(attribute, index) in &columns.attributes {
            attributes.set(attribute, parse_cell(&record, index, row, attribute.name())?);
        }
        let mut metrics = MetricValues::default();
        for &(metric, index) in &columns.metrics {
            metrics.set(metric, parse_cell(&record, index, row, metric.name())?);
        }

        let subsector = record.get(columns.subsector).unwrap_or("");
        rows.push(ReferenceRow::new(subsector, attributes, metrics));
    }

    let dataset = ReferenceDataset::new(rows)?;
    info!(
        rows = dataset.len(),
        subsectors = dataset.subsectors().len(),
        "loaded reference dataset"
    );
    Ok(dataset)
}

/// Load a reference dataset from a CSV file.
pub fn load_reference(path: impl AsRef<Path>) -> Result<ReferenceDataset> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening reference dataset");
    read_reference(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const HEADER: &str =
        "Sub Sektor,ipo_price,market_cap,roe,net_income,der,free_float,std,dsd,sharpe_ratio,sortino_ratio,liquidity_ratio";

    fn csv_with(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_read_rows() {
        let data = csv_with(&[
            "Banks,0.1,0.2,0.3,0.4,0.5,0.6,0.11,0.07,1.2,1.9,0.003",
            "Utilities,-1.0,0.0,1.5,-0.2,0.9,-0.4,0.25,0.12,0.4,0.6,0.010",
        ]);
        let dataset = read_reference(data.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 2);
        let row = &dataset.rows()[1];
        assert_eq!(row.subsector, "Utilities");
        assert_relative_eq!(row.attributes.ipo_price, -1.0);
        assert_relative_eq!(row.attributes.free_float, -0.4);
        assert_relative_eq!(row.metrics.sharpe_ratio, 0.4);
        assert_relative_eq!(row.metrics.liquidity_ratio, 0.010);
    }

    #[test]
    fn test_label_kept_verbatim() {
        let data = csv_with(&[
            "\"Food & Staples Retailing \",0,0,0,0,0,0,0,0,0,0,0",
            "\"Oil, Gas, & Coal\",0,0,0,0,0,0,0,0,0,0,0",
        ]);
        let dataset = read_reference(data.as_bytes()).unwrap();
        assert_eq!(
            dataset.subsectors(),
            vec!["Food & Staples Retailing ", "Oil, Gas, & Coal"]
        );
    }

    #[test]
    fn test_headers_trimmed_and_reordered() {
        let data = "extra, liquidity_ratio ,sortino_ratio,sharpe_ratio,dsd,std,free_float,der,net_income,roe,market_cap,ipo_price, Sub Sektor \n\
                    x,0.5,0.4,0.3,0.2,0.1,6,5,4,3,2,1,Banks";
        let dataset = read_reference(data.as_bytes()).unwrap();

        let row = &dataset.rows()[0];
        assert_eq!(row.subsector, "Banks");
        assert_relative_eq!(row.attributes.ipo_price, 1.0);
        assert_relative_eq!(row.attributes.free_float, 6.0);
        assert_relative_eq!(row.metrics.std, 0.1);
        assert_relative_eq!(row.metrics.liquidity_ratio, 0.5);
    }

    #[rstest]
    #[case("der")]
    #[case("sharpe_ratio")]
    #[case("Sub Sektor")]
    fn test_missing_column(#[case] column: &str) {
        let header: Vec<&str> = HEADER.split(',').filter(|h| *h != column).collect();
        let data = header.join(",");

        let err = read_reference(data.as_bytes()).unwrap_err();
        assert_eq!(
            err.as_model(),
            Some(&RiskError::SchemaMismatch {
                field: column.to_string(),
                origin: SchemaOrigin::Dataset,
            })
        );
    }

    #[test]
    fn test_unparsable_cell_reports_row() {
        let data = csv_with(&[
            "Banks,0,0,0,0,0,0,0,0,0,0,0",
            "Banks,0,0,0,0,n.a.,0,0,0,0,0,0",
        ]);
        let err = read_reference(data.as_bytes()).unwrap_err();
        match err {
            DataError::Parse { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, "der");
                assert_eq!(value, "n.a.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let data = csv_with(&["Banks,0,0,0,0,0,0,0,0,inf,0,0"]);
        let err = read_reference(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err.as_model(),
            Some(RiskError::InvalidValue { field, .. }) if field == "row 0 sharpe_ratio"
        ));
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let dataset = read_reference(HEADER.as_bytes()).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = load_reference("/nonexistent/reference.csv").unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }
}
