//! IDX sub-sector labels.
//!
//! Labels are the exact strings found in the reference dataset's
//! `Sub Sektor` column, spelling and trailing whitespace included.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A label that is not one of the known sub-sectors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown sub-sector: '{0}'")]
pub struct UnknownSubsector(pub String);

/// Industry sub-sectors of the reference universe (27 labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Subsector {
    /// Apparel & Luxury Goods
    ApparelLuxuryGoods,
    /// Properties & Real Estate
    PropertiesRealEstate,
    /// Oil, Gas, & Coal
    OilGasCoal,
    /// Automobiles & Components
    AutomobilesComponents,
    /// Basic Materials
    BasicMaterials,
    /// Food & Beverage
    FoodBeverage,
    /// Software & IT Service
    SoftwareItService,
    /// Utilities
    Utilities,
    /// Retailing
    Retailing,
    /// Heavy Constructions & Civil
    HeavyConstructionsCivil,
    /// Consumer Services
    ConsumerServices,
    /// Healthcare Equipment & Providers
    HealthcareEquipmentProviders,
    /// Leisure Goods
    LeisureGoods,
    /// Industrial Services
    IndustrialServices,
    /// Nondurable Household Products
    NondurableHouseholdProducts,
    /// Food & Staples Retailing (label carries a trailing space)
    FoodStaplesRetailing,
    /// Technology Hardware
    TechnologyHardware,
    /// Telecommunication
    Telecommunication,
    /// Media & Entertainment
    MediaEntertainment,
    /// Logistics & Deliveries
    LogisticsDeliveries,
    /// Multi Sector Holdings
    MultiSectorHoldings,
    /// Industrial Goods
    IndustrialGoods,
    /// Household Goods
    HouseholdGoods,
    /// Banks
    Banks,
    /// Pharmaceuticals & Healthcare (label is spelled "Phramaceuticals")
    PharmaceuticalsHealthcare,
    /// Alternative Energy
    AlternativeEnergy,
    /// Financing Service
    FinancingService,
}

impl Subsector {
    /// Returns all sub-sectors in listing order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::ApparelLuxuryGoods,
            Self::PropertiesRealEstate,
            Self::OilGasCoal,
            Self::AutomobilesComponents,
            Self::BasicMaterials,
            Self::FoodBeverage,
            Self::SoftwareItService,
            Self::Utilities,
            Self::Retailing,
            Self::HeavyConstructionsCivil,
            Self::ConsumerServices,
            Self::HealthcareEquipmentProviders,
            Self::LeisureGoods,
            Self::IndustrialServices,
            Self::NondurableHouseholdProducts,
            Self::FoodStaplesRetailing,
            Self::TechnologyHardware,
            Self::Telecommunication,
            Self::MediaEntertainment,
            Self::LogisticsDeliveries,
            Self::MultiSectorHoldings,
            Self::IndustrialGoods,
            Self::HouseholdGoods,
            Self::Banks,
            Self::PharmaceuticalsHealthcare,
            Self::AlternativeEnergy,
            Self::FinancingService,
        ]
    }

    /// Returns the dataset label, verbatim.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ApparelLuxuryGoods => "Apparel & Luxury Goods",
            Self::PropertiesRealEstate => "Properties & Real Estate",
            Self::OilGasCoal => "Oil, Gas, & Coal",
            Self::AutomobilesComponents => "Automobiles & Components",
            Self::BasicMaterials => "Basic Materials",
            Self::FoodBeverage => "Food & Beverage",
            Self::SoftwareItService => "Software & IT Service",
            Self::Utilities => "Utilities",
            Self::Retailing => "Retailing",
            Self::HeavyConstructionsCivil => "Heavy Constructions & Civil",
            Self::ConsumerServices => "Consumer Services",
            Self::HealthcareEquipmentProviders => "Healthcare Equipment & Providers",
            Self::LeisureGoods => "Leisure Goods",
            Self::IndustrialServices => "Industrial Services",
            Self::NondurableHouseholdProducts => "Nondurable Household Products",
            Self::FoodStaplesRetailing => "Food & Staples Retailing ",
            Self::TechnologyHardware => "Technology Hardware",
            Self::Telecommunication => "Telecommunication",
            Self::MediaEntertainment => "Media & Entertainment",
            Self::LogisticsDeliveries => "Logistics & Deliveries",
            Self::MultiSectorHoldings => "Multi Sector Holdings",
            Self::IndustrialGoods => "Industrial Goods",
            Self::HouseholdGoods => "Household Goods",
            Self::Banks => "Banks",
            Self::PharmaceuticalsHealthcare => "Phramaceuticals & Healthcare",
            Self::AlternativeEnergy => "Alternative Energy",
            Self::FinancingService => "Financing Service",
        }
    }

    /// Look up a sub-sector by its exact dataset label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().into_iter().find(|s| s.label() == label)
    }

    /// Look up a sub-sector ignoring surrounding whitespace and case.
    ///
    /// Useful for user input; the returned variant's [`label`](Self::label)
    /// is the exact string to query with.
    pub fn find(input: &str) -> Option<Self> {
        let wanted = input.trim();
        Self::all()
            .into_iter()
            .find(|s| s.label().trim().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Subsector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Subsector {
    type Err = UnknownSubsector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| UnknownSubsector(s.to_string()))
    }
}

impl TryFrom<String> for Subsector {
    type Error = UnknownSubsector;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subsector> for String {
    fn from(value: Subsector) -> Self {
        value.label().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_all_subsectors() {
        let subsectors = Subsector::all();
        assert_eq!(subsectors.len(), 27);

        let mut labels: Vec<&str> = subsectors.iter().map(Subsector::label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), 27);
    }

    #[test]
    fn test_label_keeps_trailing_space() {
        assert_eq!(
            Subsector::FoodStaplesRetailing.label(),
            "Food & Staples Retailing "
        );
        assert_eq!(
            Subsector::from_label("Food & Staples Retailing "),
            Some(Subsector::FoodStaplesRetailing)
        );
        assert_eq!(Subsector::from_label("Food & Staples Retailing"), None);
    }

    #[rstest]
    #[case("banks", Subsector::Banks)]
    #[case("  Food & Staples Retailing", Subsector::FoodStaplesRetailing)]
    #[case("oil, gas, & coal", Subsector::OilGasCoal)]
    fn test_find_is_lenient(#[case] input: &str, #[case] expected: Subsector) {
        assert_eq!(Subsector::find(input), Some(expected));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Banks".parse::<Subsector>(), Ok(Subsector::Banks));
        assert_eq!(
            "Fintech".parse::<Subsector>(),
            Err(UnknownSubsector("Fintech".to_string()))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", Subsector::PharmaceuticalsHealthcare),
            "Phramaceuticals & Healthcare"
        );
    }

    #[test]
    fn test_serde_uses_label() {
        let json = serde_json::to_string(&Subsector::FoodStaplesRetailing).unwrap();
        assert_eq!(json, r#""Food & Staples Retailing ""#);

        let parsed: Subsector = serde_json::from_str(r#""Banks""#).unwrap();
        assert_eq!(parsed, Subsector::Banks);
        assert!(serde_json::from_str::<Subsector>(r#""Nope""#).is_err());
    }
}
