mod cost;
mod validate;

pub use cost::{apartment_divisor, consumption, utility_cost, ReadingPair, UtilityCost};
pub use validate::{
    ensure_meter_valid, ensure_meters_valid, validate_meter, validate_reading, FieldIssue,
    ValidationReport,
};
