use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::fmt;

use crate::billing::{utility_cost, ReadingPair, UtilityCost};
use crate::config::{Meter, Property, Reading, UtilityLine};
use crate::error::{LedgerError, Result};
use crate::money::round2;

/// A billing month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Parse "YYYY-MM"
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || LedgerError::InvalidPeriod(input.to_string());
        let (year, month) = input.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Latest reading of a meter matching `filter`; ties go to the one recorded last
fn latest_reading<'a>(
    readings: &'a [Reading],
    meter_id: &str,
    filter: impl Fn(&Reading) -> bool,
) -> Option<&'a Reading> {
    readings
        .iter()
        .enumerate()
        .filter(|(_, r)| r.meter == meter_id && filter(*r))
        .max_by_key(|(idx, r)| (r.date, *idx))
        .map(|(_, r)| r)
}

/// Most recent reading of a meter dated strictly before `date`
pub fn previous_reading<'a>(
    readings: &'a [Reading],
    meter_id: &str,
    date: NaiveDate,
) -> Option<&'a Reading> {
    latest_reading(readings, meter_id, |r| r.date < date)
}

/// The reading pair billed for a meter in a period: the period's latest
/// reading against its stored previous value, or the reading before it.
pub fn reading_pair(readings: &[Reading], meter_id: &str, period: Period) -> Option<ReadingPair> {
    let current = latest_reading(readings, meter_id, |r| period.contains(r.date))?;
    let previous = current
        .previous
        .or_else(|| previous_reading(readings, meter_id, current.date).map(|r| r.value));

    Some(ReadingPair {
        previous,
        current: current.value,
    })
}

#[derive(Debug)]
pub struct MeterCost<'a> {
    pub id: &'a str,
    pub meter: &'a Meter,
    pub reading: Option<ReadingPair>,
    pub cost: UtilityCost,
}

impl MeterCost<'_> {
    pub fn to_line(&self) -> UtilityLine {
        UtilityLine {
            meter: self.id.to_string(),
            name: self.meter.name.clone(),
            consumption: self.cost.consumption(),
            cost: self.cost.cost().map(round2),
        }
    }
}

/// Cost every meter of a property for one period, ordered by meter id
pub fn period_costs<'a>(
    property_id: &str,
    property: &Property,
    meters: &'a HashMap<String, Meter>,
    readings: &[Reading],
    period: Period,
) -> Vec<MeterCost<'a>> {
    let mut costs: Vec<MeterCost<'a>> = meters
        .iter()
        .filter(|(_, m)| m.property == property_id)
        .map(|(id, meter)| {
            let reading = reading_pair(readings, id, period);
            let cost = utility_cost(meter, reading, property.apartment_count);
            if cost == UtilityCost::Pending {
                tracing::warn!(meter = %id, %period, "No reading for period, cost pending");
            }
            MeterCost {
                id: id.as_str(),
                meter,
                reading,
                cost,
            }
        })
        .collect();
    costs.sort_by(|a, b| a.id.cmp(b.id));
    costs
}

/// Sum of known utility costs; pending lines are left out
pub fn utilities_total(lines: &[UtilityLine]) -> f64 {
    round2(lines.iter().filter_map(|l| l.cost).sum())
}
