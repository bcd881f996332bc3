//! Reference dataset and query records.

use crate::error::{Result, RiskError, SchemaOrigin};
use crate::schema::{Attribute, AttributeValues, MetricValues};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A previously listed stock with known realized risk metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    /// Sub-sector label, compared byte-for-byte
    pub subsector: String,
    /// Standardized attributes
    pub attributes: AttributeValues,
    /// Precomputed risk metrics
    pub metrics: MetricValues,
}

impl ReferenceRow {
    /// Create a new reference row.
    pub fn new(
        subsector: impl Into<String>,
        attributes: AttributeValues,
        metrics: MetricValues,
    ) -> Self {
        Self {
            subsector: subsector.into(),
            attributes,
            metrics,
        }
    }
}

/// Immutable table of reference rows.
///
/// Row order is significant: peers with equal similarity are ranked in
/// dataset order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceDataset {
    rows: Vec<ReferenceRow>,
}

impl ReferenceDataset {
    /// Build a dataset, rejecting rows with NaN or infinite values.
    pub fn new(rows: Vec<ReferenceRow>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            let context = format!("row {i} ");
            row.attributes.validate(&context)?;
            row.metrics.validate(&context)?;
        }
        Ok(Self { rows })
    }

    /// All rows in dataset order.
    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct sub-sector labels in order of first appearance.
    pub fn subsectors(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.subsector.as_str()) {
                seen.push(row.subsector.as_str());
            }
        }
        seen
    }

    /// Number of rows labeled with `subsector`.
    pub fn count_in_subsector(&self, subsector: &str) -> usize {
        self.rows.iter().filter(|r| r.subsector == subsector).count()
    }
}

/// Observation matrix (rows x attributes) for a subset of attributes.
pub fn attribute_matrix(rows: &[ReferenceRow], attributes: &[Attribute]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), attributes.len()), |(i, j)| {
        rows[i].attributes.get(attributes[j])
    })
}

/// The stock being projected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryVector {
    /// Sub-sector label to match peers against
    pub subsector: String,
    /// Standardized attributes
    pub attributes: AttributeValues,
}

impl QueryVector {
    /// Create a query from typed attribute values.
    pub fn new(subsector: impl Into<String>, attributes: AttributeValues) -> Result<Self> {
        attributes.validate("query ")?;
        Ok(Self {
            subsector: subsector.into(),
            attributes,
        })
    }

    /// Create a query from a name-to-value record.
    pub fn from_map(subsector: impl Into<String>, values: &HashMap<String, f64>) -> Result<Self> {
        let attributes = AttributeValues::from_map(values, SchemaOrigin::Query)?;
        Ok(Self {
            subsector: subsector.into(),
            attributes,
        })
    }

    /// Query values for a subset of attributes.
    pub fn select(&self, attributes: &[Attribute]) -> Vec<f64> {
        self.attributes.select(attributes)
    }
}

/// Fails with [`RiskError::InvalidConfig`] if `attributes` is empty.
pub(crate) fn require_attributes(attributes: &[Attribute]) -> Result<()> {
    if attributes.is_empty() {
        return Err(RiskError::InvalidConfig(
            "attribute subset must not be empty".to_string(),
        ));
    }
    Ok(())
}
