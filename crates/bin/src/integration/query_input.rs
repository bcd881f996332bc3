//! Query assembly from flags and JSON files.

use anyhow::{Context, Result, bail};
use clap::Args;
use iporisk::Subsector;
use iporisk_data::load_query;
use iporisk_model::{Attribute, AttributeValues, QueryVector};
use std::path::Path;
use tracing::warn;

/// Standardized attribute flags.
#[derive(Debug, Default, Args)]
pub(crate) struct AttributeArgs {
    /// Standardized IPO price
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) ipo_price: Option<f64>,

    /// Standardized market capitalization
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) market_cap: Option<f64>,

    /// Standardized return on equity
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) roe: Option<f64>,

    /// Standardized net income
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) net_income: Option<f64>,

    /// Standardized debt-to-equity ratio
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) der: Option<f64>,

    /// Standardized free float
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) free_float: Option<f64>,
}

impl AttributeArgs {
    const fn get(&self, attribute: Attribute) -> Option<f64> {
        match attribute {
            Attribute::IpoPrice => self.ipo_price,
            Attribute::MarketCap => self.market_cap,
            Attribute::Roe => self.roe,
            Attribute::NetIncome => self.net_income,
            Attribute::Der => self.der,
            Attribute::FreeFloat => self.free_float,
        }
    }

    /// Overwrite `base` with every flag that was given.
    fn apply(&self, base: &mut AttributeValues) {
        for attribute in Attribute::ALL {
            if let Some(value) = self.get(attribute) {
                base.set(attribute, value);
            }
        }
    }

    /// All six values; fails naming every missing flag.
    fn complete(&self) -> Result<AttributeValues> {
        let missing: Vec<String> = Attribute::ALL
            .iter()
            .filter(|&&a| self.get(a).is_none())
            .map(|a| format!("--{}", a.name().replace('_', "-")))
            .collect();
        if !missing.is_empty() {
            bail!("missing attribute flags: {}", missing.join(", "));
        }
        let mut values = AttributeValues::default();
        self.apply(&mut values);
        Ok(values)
    }
}

/// Map user input to a dataset label.
///
/// Known sub-sectors are matched leniently and replaced by their exact
/// label; anything else is passed through unchanged.
pub(crate) fn resolve_subsector(input: &str) -> String {
    Subsector::find(input).map_or_else(
        || {
            warn!(input, "not a known sub-sector label, using it verbatim");
            input.to_string()
        },
        |s| s.label().to_string(),
    )
}

/// Build the query from a JSON file and/or flags.
///
/// Flags override the file's values.
pub(crate) fn build_query(
    path: Option<&Path>,
    subsector: Option<&str>,
    attributes: &AttributeArgs,
) -> Result<QueryVector> {
    match path {
        Some(path) => {
            let mut query = load_query(path)
                .with_context(|| format!("failed to load query {}", path.display()))?;
            if let Some(label) = subsector {
                query.subsector = resolve_subsector(label);
            }
            attributes.apply(&mut query.attributes);
            Ok(QueryVector::new(query.subsector, query.attributes)?)
        }
        None => {
            let Some(label) = subsector else {
                bail!("--subsector is required without --query");
            };
            Ok(QueryVector::new(resolve_subsector(label), attributes.complete()?)?)
        }
    }
}
