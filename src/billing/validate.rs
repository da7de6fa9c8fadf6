use std::collections::HashMap;
use std::fmt;

use crate::config::{CollectionMode, DistributionMethod, Meter, MeterScope, MeterUnit};
use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors block saving; warnings are advisory only
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<FieldIssue>,
    pub warnings: Vec<FieldIssue>,
}

impl ValidationReport {
    fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldIssue {
            field,
            message: message.into(),
        });
    }

    fn warn(&mut self, field: &'static str, message: impl Into<String>) {
        self.warnings.push(FieldIssue {
            field,
            message: message.into(),
        });
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors joined into a single line for error messages
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub fn validate_meter(meter: &Meter) -> ValidationReport {
    let mut report = ValidationReport::default();

    if meter.name.trim().is_empty() {
        report.error("name", "Meter name is required");
    }

    if meter.price_per_unit.is_some_and(|p| !p.is_finite() || p < 0.0) {
        report.error("price_per_unit", "Price cannot be negative");
    }
    if meter.fixed_price.is_some_and(|p| !p.is_finite() || p < 0.0) {
        report.error("fixed_price", "Fixed price cannot be negative");
    }

    if meter.scope == MeterScope::Individual
        && meter.distribution != DistributionMethod::PerConsumption
    {
        report.error(
            "distribution",
            "Individual meters must be distributed per consumption",
        );
    }

    if meter.is_fixed() {
        if meter.fixed_price.is_none() {
            report.error("fixed_price", "Fixed-split meters need a fixed monthly price");
        }
        if meter.price_per_unit.is_some() {
            report.error(
                "price_per_unit",
                "Fixed-price meters cannot carry a per-unit price",
            );
        }
    } else {
        if meter.price_per_unit.is_none() {
            report.error("price_per_unit", "Metered meters need a price per unit");
        }
        if meter.unit == MeterUnit::Currency {
            report.error("unit", "Currency-only meters must use a fixed split");
        }
    }

    if meter.display_price() == Some(0.0) {
        report.warn("price", "Price is zero; this meter will be billed as free");
    }

    if meter.scope == MeterScope::Communal
        && matches!(
            meter.distribution,
            DistributionMethod::PerArea | DistributionMethod::PerPerson
        )
    {
        report.warn(
            "distribution",
            format!(
                "{} shares are apportioned equally by apartment count",
                meter.distribution
            ),
        );
    }

    if meter.collection == CollectionMode::TenantPhoto && !meter.requires_photo {
        report.warn(
            "requires_photo",
            "Tenant submissions without a photo cannot be verified",
        );
    }

    report
}

/// Fail on the first meter of `property_id` (by id) that has validation errors
pub fn ensure_meters_valid(property_id: &str, meters: &HashMap<String, Meter>) -> Result<()> {
    let mut ids: Vec<&String> = meters
        .iter()
        .filter(|(_, m)| m.property == property_id)
        .map(|(id, _)| id)
        .collect();
    ids.sort();

    for id in ids {
        ensure_meter_valid(id, &meters[id])?;
    }
    Ok(())
}

pub fn ensure_meter_valid(id: &str, meter: &Meter) -> Result<()> {
    let report = validate_meter(meter);
    if report.is_valid() {
        return Ok(());
    }
    Err(LedgerError::InvalidMeter {
        meter: id.to_string(),
        issues: report.error_summary(),
    })
}

/// Check a new reading before it is stored
pub fn validate_reading(
    meter: &Meter,
    value: f64,
    previous: Option<f64>,
    photo: Option<&str>,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !value.is_finite() || value < 0.0 {
        report.error("value", "Reading cannot be negative");
    }

    if meter.requires_photo && photo.map_or(true, |p| p.trim().is_empty()) {
        report.error("photo", "This meter requires a photo of the reading");
    }

    if let Some(previous) = previous {
        if value < previous {
            report.warn(
                "value",
                format!("Reading is below the previous value {previous}; consumption counts as 0"),
            );
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeterKind;

    fn water_meter() -> Meter {
        Meter {
            name: "Cold water".to_string(),
            property: "flat".to_string(),
            kind: MeterKind::WaterCold,
            scope: MeterScope::Individual,
            unit: MeterUnit::CubicMeters,
            price_per_unit: Some(1.5),
            fixed_price: None,
            distribution: DistributionMethod::PerConsumption,
            requires_photo: false,
            collection: CollectionMode::Landlord,
        }
    }

    fn fields(issues: &[FieldIssue]) -> Vec<&'static str> {
        issues.iter().map(|i| i.field).collect()
    }

    #[test]
    fn well_formed_meter_passes() {
        let report = validate_meter(&water_meter());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_name_and_negative_price_block_saving() {
        let mut meter = water_meter();
        meter.name = "  ".to_string();
        meter.price_per_unit = Some(-1.0);

        let report = validate_meter(&meter);
        assert!(!report.is_valid());
        assert_eq!(fields(&report.errors), vec!["name", "price_per_unit"]);
        assert_eq!(
            report.error_summary(),
            "name: Meter name is required; price_per_unit: Price cannot be negative"
        );
    }

    #[test]
    fn individual_meter_must_use_per_consumption() {
        let mut meter = water_meter();
        meter.distribution = DistributionMethod::PerApartment;

        let report = validate_meter(&meter);
        assert_eq!(fields(&report.errors), vec!["distribution"]);
    }

    #[test]
    fn fixed_meter_cannot_have_unit_price() {
        let mut meter = water_meter();
        meter.scope = MeterScope::Communal;
        meter.unit = MeterUnit::Currency;
        meter.distribution = DistributionMethod::FixedSplit;
        meter.fixed_price = Some(30.0);

        let report = validate_meter(&meter);
        assert_eq!(fields(&report.errors), vec!["price_per_unit"]);

        meter.price_per_unit = None;
        assert!(validate_meter(&meter).is_valid());

        meter.fixed_price = None;
        assert_eq!(fields(&validate_meter(&meter).errors), vec!["fixed_price"]);
    }

    #[test]
    fn currency_unit_requires_fixed_split() {
        let mut meter = water_meter();
        meter.unit = MeterUnit::Currency;

        assert_eq!(fields(&validate_meter(&meter).errors), vec!["unit"]);
    }

    #[test]
    fn zero_price_is_only_a_warning() {
        let mut meter = water_meter();
        meter.price_per_unit = Some(0.0);

        let report = validate_meter(&meter);
        assert!(report.is_valid());
        assert_eq!(fields(&report.warnings), vec!["price"]);
    }

    #[test]
    fn communal_per_area_warns_about_equal_split() {
        let mut meter = water_meter();
        meter.scope = MeterScope::Communal;
        meter.distribution = DistributionMethod::PerArea;

        let report = validate_meter(&meter);
        assert!(report.is_valid());
        assert_eq!(fields(&report.warnings), vec!["distribution"]);
    }

    #[test]
    fn photo_required_reading_needs_photo() {
        let mut meter = water_meter();
        meter.requires_photo = true;

        let missing = validate_reading(&meter, 107.0, Some(100.0), None);
        assert_eq!(fields(&missing.errors), vec!["photo"]);

        let present = validate_reading(&meter, 107.0, Some(100.0), Some("img/oct.jpg"));
        assert!(present.is_valid());
    }

    #[test]
    fn reading_below_previous_warns() {
        let report = validate_reading(&water_meter(), 90.0, Some(100.0), None);
        assert!(report.is_valid());
        assert_eq!(fields(&report.warnings), vec!["value"]);

        let negative = validate_reading(&water_meter(), -1.0, None, None);
        assert_eq!(fields(&negative.errors), vec!["value"]);
    }

    #[test]
    fn non_finite_prices_are_rejected() {
        let mut meter = water_meter();
        meter.price_per_unit = Some(f64::NAN);
        assert_eq!(fields(&validate_meter(&meter).errors), vec!["price_per_unit"]);

        meter.price_per_unit = Some(f64::INFINITY);
        assert_eq!(fields(&validate_meter(&meter).errors), vec!["price_per_unit"]);
    }

    #[test]
    fn property_meters_must_all_be_valid() {
        let mut broken = water_meter();
        broken.price_per_unit = Some(-5.0);
        let mut elsewhere = broken.clone();
        elsewhere.property = "other".to_string();

        let mut meters = HashMap::from([("water".to_string(), water_meter())]);
        assert!(ensure_meters_valid("flat", &meters).is_ok());

        meters.insert("elsewhere".to_string(), elsewhere);
        assert!(ensure_meters_valid("flat", &meters).is_ok());

        meters.insert("broken".to_string(), broken);
        let err = ensure_meters_valid("flat", &meters).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidMeter { ref meter, .. } if meter == "broken"));
    }
}
