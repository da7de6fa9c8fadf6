use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeterKind {
    WaterCold,
    WaterHot,
    ElectricityIndividual,
    ElectricityCommon,
    Heating,
    Gas,
    Internet,
    Waste,
    Custom,
}

/// Whether a meter measures one apartment or is shared by the building
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeterScope {
    Individual,
    Communal,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum MeterUnit {
    #[serde(rename = "m3")]
    CubicMeters,
    #[serde(rename = "kwh")]
    KilowattHours,
    /// No measured quantity, only a price
    #[serde(rename = "currency")]
    Currency,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMethod {
    PerApartment,
    PerArea,
    PerPerson,
    PerConsumption,
    FixedSplit,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMode {
    #[default]
    Landlord,
    TenantPhoto,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Meter {
    pub name: String,
    pub property: String,
    pub kind: MeterKind,
    pub scope: MeterScope,
    pub unit: MeterUnit,
    #[serde(default)]
    pub price_per_unit: Option<f64>,
    #[serde(default)]
    pub fixed_price: Option<f64>,
    pub distribution: DistributionMethod,
    #[serde(default)]
    pub requires_photo: bool,
    #[serde(default)]
    pub collection: CollectionMode,
}

impl Meter {
    pub fn is_fixed(&self) -> bool {
        self.distribution == DistributionMethod::FixedSplit
    }

    /// Price shown next to the meter: per unit for metered feeds, monthly for fixed ones
    pub fn display_price(&self) -> Option<f64> {
        if self.is_fixed() {
            self.fixed_price
        } else {
            self.price_per_unit
        }
    }
}

impl fmt::Display for MeterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MeterKind::WaterCold => "cold water",
            MeterKind::WaterHot => "hot water",
            MeterKind::ElectricityIndividual => "electricity",
            MeterKind::ElectricityCommon => "common electricity",
            MeterKind::Heating => "heating",
            MeterKind::Gas => "gas",
            MeterKind::Internet => "internet",
            MeterKind::Waste => "waste",
            MeterKind::Custom => "custom",
        };
        f.write_str(label)
    }
}

impl fmt::Display for MeterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeterScope::Individual => f.write_str("individual"),
            MeterScope::Communal => f.write_str("communal"),
        }
    }
}

impl fmt::Display for MeterUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeterUnit::CubicMeters => f.write_str("m3"),
            MeterUnit::KilowattHours => f.write_str("kWh"),
            MeterUnit::Currency => f.write_str("-"),
        }
    }
}

impl fmt::Display for DistributionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DistributionMethod::PerApartment => "per apartment",
            DistributionMethod::PerArea => "per area",
            DistributionMethod::PerPerson => "per person",
            DistributionMethod::PerConsumption => "per consumption",
            DistributionMethod::FixedSplit => "fixed split",
        };
        f.write_str(label)
    }
}
