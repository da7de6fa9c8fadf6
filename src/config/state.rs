use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;
use crate::ledger::{reconcile, Reconciliation};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct State {
    pub counter: Counter,
    #[serde(default)]
    pub invoices: Vec<InvoiceEntry>,
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default)]
    pub deposits: Vec<DepositEvent>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Counter {
    pub last_number: u32,
    pub last_year: u32,
}

impl Default for Counter {
    fn default() -> Self {
        Self {
            last_number: 0,
            last_year: Utc::now().year() as u32,
        }
    }
}

/// A single meter reading
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Reading {
    pub meter: String,
    pub date: NaiveDate,
    pub value: f64,
    #[serde(default)]
    pub previous: Option<f64>,
    /// Photo reference submitted with the reading
    #[serde(default)]
    pub photo: Option<String>,
}

/// One meter's contribution to an invoice. `cost` is `None` while pending.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UtilityLine {
    pub meter: String,
    pub name: String,
    #[serde(default)]
    pub consumption: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Payment {
    pub amount: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InvoiceEntry {
    pub number: String,
    pub property: String,
    /// Billing period, YYYY-MM
    pub period: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub rent: f64,
    #[serde(default)]
    pub utilities: f64,
    #[serde(default)]
    pub other: f64,
    pub amount: f64,
    #[serde(default)]
    pub lines: Vec<UtilityLine>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl InvoiceEntry {
    pub fn reconcile(&self, today: NaiveDate) -> Reconciliation {
        reconcile(self.amount, &self.payments, self.due_date, today)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DepositKind {
    Received,
    Adjustment,
    Refund,
}

impl DepositKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositKind::Received => "received",
            DepositKind::Adjustment => "adjustment",
            DepositKind::Refund => "refund",
        }
    }
}

impl fmt::Display for DepositKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DepositKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "received" => Ok(DepositKind::Received),
            "adjustment" => Ok(DepositKind::Adjustment),
            "refund" => Ok(DepositKind::Refund),
            _ => Err(LedgerError::InvalidDepositKind(s.to_string())),
        }
    }
}

/// Append-only deposit journal entry
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DepositEvent {
    pub property: String,
    pub kind: DepositKind,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
    pub balance_after: f64,
    #[serde(default)]
    pub note: Option<String>,
}
