use chrono::{DateTime, Utc};

use crate::config::{DepositEvent, DepositKind};
use crate::error::{LedgerError, Result};
use crate::money::round2;

/// Amount as it moves the balance: refunds subtract, everything else adds
pub fn signed_amount(kind: DepositKind, amount: f64) -> f64 {
    match kind {
        DepositKind::Received | DepositKind::Adjustment => amount,
        DepositKind::Refund => -amount,
    }
}

/// Latest event for a property. Events sharing a timestamp resolve to the one appended last.
pub fn latest<'a>(events: &'a [DepositEvent], property: &str) -> Option<&'a DepositEvent> {
    events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.property == property)
        .max_by_key(|(idx, e)| (e.created_at, *idx))
        .map(|(_, e)| e)
}

/// Authoritative deposit balance, if the property has any events
pub fn current_balance(events: &[DepositEvent], property: &str) -> Option<f64> {
    latest(events, property).map(|e| e.balance_after)
}

/// A property's journal, newest first
pub fn history<'a>(events: &'a [DepositEvent], property: &str) -> Vec<&'a DepositEvent> {
    let mut rows: Vec<(usize, &DepositEvent)> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.property == property)
        .collect();
    rows.sort_by(|(ia, a), (ib, b)| (b.created_at, ib).cmp(&(a.created_at, ia)));
    rows.into_iter().map(|(_, e)| e).collect()
}

fn check_amount(kind: DepositKind, amount: f64) -> Result<()> {
    let ok = match kind {
        DepositKind::Received | DepositKind::Refund => amount.is_finite() && amount > 0.0,
        DepositKind::Adjustment => amount.is_finite() && amount != 0.0,
    };
    if ok {
        return Ok(());
    }
    Err(LedgerError::InvalidDepositAmount {
        kind: kind.as_str(),
        requirement: match kind {
            DepositKind::Adjustment => "non-zero",
            _ => "greater than zero",
        },
    })
}

/// Append an event to the journal.
///
/// The new balance builds on the property's latest event, or on `baseline`
/// (default 0) when the property has none yet.
pub fn record(
    events: &mut Vec<DepositEvent>,
    property: &str,
    kind: DepositKind,
    amount: f64,
    baseline: Option<f64>,
    note: Option<String>,
    created_at: DateTime<Utc>,
) -> Result<DepositEvent> {
    check_amount(kind, amount)?;

    let previous = current_balance(events, property).unwrap_or_else(|| baseline.unwrap_or(0.0));
    let balance_after = round2(previous + signed_amount(kind, amount));

    if kind == DepositKind::Refund && balance_after < 0.0 {
        return Err(LedgerError::RefundExceedsBalance {
            property: property.to_string(),
            amount,
            balance: previous,
        });
    }

    let event = DepositEvent {
        property: property.to_string(),
        kind,
        amount,
        created_at,
        balance_after,
        note,
    };
    events.push(event.clone());

    tracing::info!(
        property,
        kind = kind.as_str(),
        amount,
        balance_after,
        "Recorded deposit event"
    );

    Ok(event)
}
