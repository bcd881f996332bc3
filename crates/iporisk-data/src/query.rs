//! Query records from JSON.
//!
//! ```json
//! {
//!   "subsector": "Banks",
//!   "attributes": { "ipo_price": 0.1, "market_cap": -0.4, "roe": 0.2,
//!                   "net_income": 0.3, "der": 1.1, "free_float": -0.2 }
//! }
//! ```

use crate::error::Result;
use iporisk_model::QueryVector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A query as written on disk, before schema checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Sub-sector label, used verbatim
    pub subsector: String,
    /// Attribute name to standardized value
    pub attributes: HashMap<String, f64>,
}

impl QueryRecord {
    /// Check the attribute names and values and build the query.
    pub fn into_query(self) -> Result<QueryVector> {
        Ok(QueryVector::from_map(self.subsector, &self.attributes)?)
    }
}

/// Parse a query from a JSON string.
pub fn parse_query(json: &str) -> Result<QueryVector> {
    let record: QueryRecord = serde_json::from_str(json)?;
    record.into_query()
}

/// Read a query from any JSON source.
pub fn read_query<R: Read>(reader: R) -> Result<QueryVector> {
    let record: QueryRecord = serde_json::from_reader(reader)?;
    record.into_query()
}

/// Load a query from a JSON file.
pub fn load_query(path: impl AsRef<Path>) -> Result<QueryVector> {
    read_query(BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use approx::assert_relative_eq;
    use iporisk_model::{RiskError, SchemaOrigin};

    #[test]
    fn test_parse_query() {
        let json = r#"{
            "subsector": "Food & Staples Retailing ",
            "attributes": {
                "ipo_price": 0.1, "market_cap": -0.4, "roe": 0.2,
                "net_income": 0.3, "der": 1.1, "free_float": -0.2,
                "comment_ignored": 9.0
            }
        }"#;
        let query = parse_query(json).unwrap();

        assert_eq!(query.subsector, "Food & Staples Retailing ");
        assert_relative_eq!(query.attributes.der, 1.1);
        assert_relative_eq!(query.attributes.market_cap, -0.4);
    }

    #[test]
    fn test_missing_attribute() {
        let json = r#"{"subsector": "Banks", "attributes": {"ipo_price": 0.1}}"#;
        let err = parse_query(json).unwrap_err();
        assert_eq!(
            err.as_model(),
            Some(&RiskError::SchemaMismatch {
                field: "market_cap".to_string(),
                origin: SchemaOrigin::Query,
            })
        );
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_query(r#"{"subsector": "Banks""#).unwrap_err();
        assert!(matches!(err, DataError::Serialization(_)));
    }

    #[test]
    fn test_read_query_from_bytes() {
        let json = br#"{"subsector": "Banks", "attributes": {
            "ipo_price": 0, "market_cap": 0, "roe": 0,
            "net_income": 0, "der": 0, "free_float": 0.5}}"#;
        let query = read_query(&json[..]).unwrap();
        assert_relative_eq!(query.attributes.free_float, 0.5);
    }
}
