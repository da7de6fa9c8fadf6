use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::config::Payment;
use crate::error::LedgerError;
use crate::money::round2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Paid,
    Unpaid,
    Overdue,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Paid => f.write_str("PAID"),
            InvoiceStatus::Unpaid => f.write_str("UNPAID"),
            InvoiceStatus::Overdue => f.write_str("OVERDUE"),
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paid" => Ok(InvoiceStatus::Paid),
            "unpaid" => Ok(InvoiceStatus::Unpaid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            _ => Err(LedgerError::InvalidStatusFilter(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reconciliation {
    pub paid_amount: f64,
    pub balance: f64,
    pub status: InvoiceStatus,
}

/// Fold an invoice's payments into its paid amount, balance and status.
///
/// Nothing is stored: callers recompute on every read.
pub fn reconcile(
    amount: f64,
    payments: &[Payment],
    due_date: NaiveDate,
    today: NaiveDate,
) -> Reconciliation {
    let paid_amount = round2(payments.iter().map(|p| p.amount).sum());
    let balance = round2(amount - paid_amount);

    let status = if balance <= 0.0 {
        InvoiceStatus::Paid
    } else if due_date < today {
        InvoiceStatus::Overdue
    } else {
        InvoiceStatus::Unpaid
    };

    Reconciliation {
        paid_amount,
        balance,
        status,
    }
}
