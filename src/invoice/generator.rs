use chrono::{Datelike, Duration, NaiveDate};
use std::path::Path;

use crate::billing::ensure_meters_valid;
use crate::config::{
    load_config, load_meters, load_properties, load_state, save_state, state::Counter,
    InvoiceEntry, Property, UtilityLine,
};
use crate::error::{LedgerError, Result};
use crate::invoice::statement::{period_costs, utilities_total, MeterCost, Period};
use crate::money::round2;

/// Format invoice number from template
pub fn format_invoice_number(format: &str, year: u32, seq: u32) -> String {
    format
        .replace("{year}", &year.to_string())
        .replace("{seq:04}", &format!("{:04}", seq))
        .replace("{seq:05}", &format!("{:05}", seq))
        .replace("{seq:03}", &format!("{:03}", seq))
}

/// Sequence number the counter suggests for the next invoice issued in `year`
pub fn next_sequence(counter: &Counter, year: u32) -> u32 {
    if counter.last_year == year {
        counter.last_number + 1
    } else {
        1 // Reset for new year
    }
}

/// First free invoice number for `year`, starting at the counter's suggestion.
///
/// Backdated years may already hold numbers, so taken ones are skipped.
pub fn next_number(
    format: &str,
    counter: &Counter,
    invoices: &[InvoiceEntry],
    year: u32,
) -> Result<(u32, String)> {
    let taken = |number: &str| invoices.iter().any(|e| e.number == number);

    let mut seq = next_sequence(counter, year);
    let mut number = format_invoice_number(format, year, seq);
    for _ in 0..invoices.len() {
        if !taken(&number) {
            break;
        }
        seq += 1;
        number = format_invoice_number(format, year, seq);
    }

    if taken(&number) {
        return Err(LedgerError::InvoiceNumberTaken(number));
    }
    Ok((seq, number))
}

/// Assemble an invoice from rent, utility lines and other charges
#[allow(clippy::too_many_arguments)]
pub fn build_invoice(
    number: String,
    property_id: &str,
    property: &Property,
    period: Period,
    date: NaiveDate,
    due_days: u32,
    lines: Vec<UtilityLine>,
    other: f64,
) -> InvoiceEntry {
    let utilities = utilities_total(&lines);
    let due_date = date
        .checked_add_signed(Duration::days(i64::from(due_days)))
        .unwrap_or(date);

    InvoiceEntry {
        number,
        property: property_id.to_string(),
        period: period.to_string(),
        date,
        due_date,
        rent: property.rent,
        utilities,
        other,
        amount: round2(property.rent + utilities + other),
        lines,
        payments: Vec::new(),
    }
}

/// Issue a new invoice for a property and period and store it
pub fn create_invoice(
    cfg_dir: &Path,
    property_id: &str,
    period: Period,
    date: NaiveDate,
    other: f64,
) -> Result<InvoiceEntry> {
    if !other.is_finite() || other < 0.0 {
        return Err(LedgerError::InvalidCharge);
    }

    let config = load_config(cfg_dir)?;
    let properties = load_properties(cfg_dir)?;
    let meters = load_meters(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;

    let property = properties
        .get(property_id)
        .ok_or_else(|| LedgerError::PropertyNotFound(property_id.to_string()))?;

    let period_key = period.to_string();
    if let Some(existing) = state
        .invoices
        .iter()
        .find(|e| e.property == property_id && e.period == period_key)
    {
        return Err(LedgerError::InvoiceExists {
            property: property_id.to_string(),
            period: period_key,
            number: existing.number.clone(),
        });
    }

    ensure_meters_valid(property_id, &meters)?;

    let lines: Vec<UtilityLine> =
        period_costs(property_id, property, &meters, &state.readings, period)
            .iter()
            .map(MeterCost::to_line)
            .collect();

    let year = date.year() as u32;
    let (seq, number) = next_number(
        &config.billing.number_format,
        &state.counter,
        &state.invoices,
        year,
    )?;

    let invoice = build_invoice(
        number,
        property_id,
        property,
        period,
        date,
        config.billing.due_days,
        lines,
        other,
    );

    // A backdated invoice must not rewind the counter
    if year >= state.counter.last_year {
        state.counter.last_number = seq;
        state.counter.last_year = year;
    }
    state.invoices.push(invoice.clone());
    save_state(cfg_dir, &state)?;

    tracing::info!(
        number = %invoice.number,
        property = property_id,
        period = %period,
        amount = invoice.amount,
        "Issued invoice"
    );

    Ok(invoice)
}
