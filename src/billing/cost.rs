use crate::config::{Meter, MeterScope};

/// Current reading with the value it is measured against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingPair {
    pub previous: Option<f64>,
    pub current: f64,
}

/// Apportioned cost of one meter for one period
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UtilityCost {
    /// No reading yet, as opposed to a measured zero
    Pending,
    Measured { consumption: f64, cost: f64 },
    Fixed { cost: f64 },
}

impl UtilityCost {
    pub fn cost(&self) -> Option<f64> {
        match self {
            UtilityCost::Pending => None,
            UtilityCost::Measured { cost, .. } | UtilityCost::Fixed { cost } => Some(*cost),
        }
    }

    pub fn consumption(&self) -> Option<f64> {
        match self {
            UtilityCost::Measured { consumption, .. } => Some(*consumption),
            _ => None,
        }
    }
}

/// Consumption between two readings, never negative
pub fn consumption(previous: f64, current: f64) -> f64 {
    (current - previous).max(0.0)
}

/// Number of apartments a communal cost is split across; unknown or zero counts as 1
pub fn apartment_divisor(apartment_count: Option<u32>) -> f64 {
    match apartment_count {
        Some(n) if n > 0 => f64::from(n),
        _ => 1.0,
    }
}

/// Compute what one apartment owes for a meter.
///
/// Fixed-split meters ignore readings and the per-unit price. Otherwise a
/// missing reading yields [`UtilityCost::Pending`]; a reading without a
/// previous value is a baseline and measures zero consumption.
pub fn utility_cost(
    meter: &Meter,
    reading: Option<ReadingPair>,
    apartment_count: Option<u32>,
) -> UtilityCost {
    let divisor = apartment_divisor(apartment_count);

    if meter.is_fixed() {
        return UtilityCost::Fixed {
            cost: meter.fixed_price.unwrap_or(0.0) / divisor,
        };
    }

    let Some(pair) = reading else {
        return UtilityCost::Pending;
    };

    let consumed = pair
        .previous
        .map(|previous| consumption(previous, pair.current))
        .unwrap_or(0.0);
    let raw = consumed * meter.price_per_unit.unwrap_or(0.0);

    let cost = match meter.scope {
        MeterScope::Individual => raw,
        MeterScope::Communal => raw / divisor,
    };

    UtilityCost::Measured {
        consumption: consumed,
        cost,
    }
}
