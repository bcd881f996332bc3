//! Attribute and metric schema.
//!
//! The reference dataset and query records share six standardized
//! attributes. Each of the five projected risk metrics is matched on its own
//! fixed subset of those attributes.

use crate::error::{Result, RiskError, SchemaOrigin};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Standardized (z-scored) financial and market attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Offering price at listing
    IpoPrice,
    /// Market capitalization
    MarketCap,
    /// Return on equity
    Roe,
    /// Net income for the current period
    NetIncome,
    /// Debt-to-equity ratio
    Der,
    /// Free-float share fraction
    FreeFloat,
}

impl Attribute {
    /// All attributes in column order.
    pub const ALL: [Self; 6] = [
        Self::IpoPrice,
        Self::MarketCap,
        Self::Roe,
        Self::NetIncome,
        Self::Der,
        Self::FreeFloat,
    ];

    /// Column name used in datasets and query records.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::IpoPrice => "ipo_price",
            Self::MarketCap => "market_cap",
            Self::Roe => "roe",
            Self::NetIncome => "net_income",
            Self::Der => "der",
            Self::FreeFloat => "free_float",
        }
    }

    /// Look up an attribute by column name, ignoring surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| RiskError::InvalidConfig(format!("unknown attribute '{s}'")))
    }
}

/// Risk metrics projected for a new listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskMetric {
    /// Return volatility (standard deviation)
    #[serde(rename = "std")]
    Volatility,
    /// Downside deviation
    #[serde(rename = "dsd")]
    DownsideDeviation,
    /// Sharpe ratio
    #[serde(rename = "sharpe_ratio")]
    SharpeRatio,
    /// Sortino ratio
    #[serde(rename = "sortino_ratio")]
    SortinoRatio,
    /// Liquidity ratio
    #[serde(rename = "liquidity_ratio")]
    LiquidityRatio,
}

impl RiskMetric {
    /// All metrics in reporting order.
    pub const ALL: [Self; 5] = [
        Self::Volatility,
        Self::DownsideDeviation,
        Self::SharpeRatio,
        Self::SortinoRatio,
        Self::LiquidityRatio,
    ];

    /// Column name used in datasets and result mappings.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Volatility => "std",
            Self::DownsideDeviation => "dsd",
            Self::SharpeRatio => "sharpe_ratio",
            Self::SortinoRatio => "sortino_ratio",
            Self::LiquidityRatio => "liquidity_ratio",
        }
    }

    /// Human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Volatility => "Volatility",
            Self::DownsideDeviation => "Downside Deviation",
            Self::SharpeRatio => "Sharpe Ratio",
            Self::SortinoRatio => "Sortino Ratio",
            Self::LiquidityRatio => "Liquidity Ratio",
        }
    }

    /// Attributes this metric's peers are matched on.
    pub const fn attributes(&self) -> &'static [Attribute] {
        match self {
            Self::Volatility => &[Attribute::IpoPrice, Attribute::Der],
            Self::DownsideDeviation => &[Attribute::IpoPrice, Attribute::FreeFloat],
            Self::SharpeRatio => &[Attribute::Der, Attribute::NetIncome],
            Self::SortinoRatio => &[Attribute::Roe, Attribute::Der],
            Self::LiquidityRatio => &[Attribute::MarketCap, Attribute::Der, Attribute::FreeFloat],
        }
    }

    /// Look up a metric by column name, ignoring surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for RiskMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RiskMetric {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| RiskError::InvalidConfig(format!("unknown metric '{s}'")))
    }
}

/// Values for every [`Attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeValues {
    /// Standardized IPO price
    pub ipo_price: f64,
    /// Standardized market capitalization
    pub market_cap: f64,
    /// Standardized return on equity
    pub roe: f64,
    /// Standardized net income
    pub net_income: f64,
    /// Standardized debt-to-equity ratio
    pub der: f64,
    /// Standardized free float
    pub free_float: f64,
}

impl AttributeValues {
    /// Value of a single attribute.
    pub const fn get(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::IpoPrice => self.ipo_price,
            Attribute::MarketCap => self.market_cap,
            Attribute::Roe => self.roe,
            Attribute::NetIncome => self.net_income,
            Attribute::Der => self.der,
            Attribute::FreeFloat => self.free_float,
        }
    }

    /// Set a single attribute.
    pub const fn set(&mut self, attribute: Attribute, value: f64) {
        match attribute {
            Attribute::IpoPrice => self.ipo_price = value,
            Attribute::MarketCap => self.market_cap = value,
            Attribute::Roe => self.roe = value,
            Attribute::NetIncome => self.net_income = value,
            Attribute::Der => self.der = value,
            Attribute::FreeFloat => self.free_float = value,
        }
    }

    /// Values for a subset of attributes, in the subset's order.
    pub fn select(&self, attributes: &[Attribute]) -> Vec<f64> {
        attributes.iter().map(|&a| self.get(a)).collect()
    }

    /// Build from a name-to-value map.
    ///
    /// Every attribute must be present; extra keys are ignored.
    pub fn from_map(values: &HashMap<String, f64>, origin: SchemaOrigin) -> Result<Self> {
        let mut out = Self::default();
        for attribute in Attribute::ALL {
            let value = values
                .get(attribute.name())
                .copied()
                .ok_or_else(|| RiskError::SchemaMismatch {
                    field: attribute.name().to_string(),
                    origin,
                })?;
            out.set(attribute, value);
        }
        out.validate("")?;
        Ok(out)
    }

    /// Reject NaN and infinite values. `context` prefixes the field name.
    pub fn validate(&self, context: &str) -> Result<()> {
        for attribute in Attribute::ALL {
            let value = self.get(attribute);
            if !value.is_finite() {
                return Err(RiskError::InvalidValue {
                    field: format!("{context}{attribute}"),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Precomputed values for every [`RiskMetric`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricValues {
    /// Realized volatility
    pub std: f64,
    /// Realized downside deviation
    pub dsd: f64,
    /// Realized Sharpe ratio
    pub sharpe_ratio: f64,
    /// Realized Sortino ratio
    pub sortino_ratio: f64,
    /// Realized liquidity ratio
    pub liquidity_ratio: f64,
}

impl MetricValues {
    /// Value of a single metric.
    pub const fn get(&self, metric: RiskMetric) -> f64 {
        match metric {
            RiskMetric::Volatility => self.std,
            RiskMetric::DownsideDeviation => self.dsd,
            RiskMetric::SharpeRatio => self.sharpe_ratio,
            RiskMetric::SortinoRatio => self.sortino_ratio,
            RiskMetric::LiquidityRatio => self.liquidity_ratio,
        }
    }

    /// Set a single metric.
    pub const fn set(&mut self, metric: RiskMetric, value: f64) {
        match metric {
            RiskMetric::Volatility => self.std = value,
            RiskMetric::DownsideDeviation => self.dsd = value,
            RiskMetric::SharpeRatio => self.sharpe_ratio = value,
            RiskMetric::SortinoRatio => self.sortino_ratio = value,
            RiskMetric::LiquidityRatio => self.liquidity_ratio = value,
        }
    }

    /// Reject NaN and infinite values. `context` prefixes the field name.
    pub fn validate(&self, context: &str) -> Result<()> {
        for metric in RiskMetric::ALL {
            let value = self.get(metric);
            if !value.is_finite() {
                return Err(RiskError::InvalidValue {
                    field: format!("{context}{metric}"),
                    value,
                });
            }
        }
        Ok(())
    }
}
