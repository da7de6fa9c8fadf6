use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use crate::config::{CollectionMode, Meter, Property, State};
use crate::invoice::{reading_pair, Period};
use crate::ledger::{deposit, InvoiceStatus};
use crate::money::format_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeKind {
    OverdueInvoice,
    MissingReading,
    DepositShortfall,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::OverdueInvoice => f.write_str("overdue"),
            NoticeKind::MissingReading => f.write_str("reading"),
            NoticeKind::DepositShortfall => f.write_str("deposit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub subject: String,
    pub message: String,
}

/// Everything that needs the landlord's attention as of `today`
pub fn collect_notices(
    properties: &HashMap<String, Property>,
    meters: &HashMap<String, Meter>,
    state: &State,
    today: NaiveDate,
    currency_symbol: &str,
) -> Vec<Notice> {
    let mut notices = Vec::new();

    for invoice in &state.invoices {
        let r = invoice.reconcile(today);
        if r.status == InvoiceStatus::Overdue {
            let days = (today - invoice.due_date).num_days();
            notices.push(Notice {
                kind: NoticeKind::OverdueInvoice,
                subject: invoice.number.clone(),
                message: format!(
                    "{} overdue by {} day(s) for {}",
                    format_amount(r.balance, currency_symbol),
                    days,
                    invoice.property
                ),
            });
        }
    }

    let period = Period::containing(today);
    for (id, meter) in meters {
        if meter.collection != CollectionMode::TenantPhoto {
            continue;
        }
        if reading_pair(&state.readings, id, period).is_none() {
            notices.push(Notice {
                kind: NoticeKind::MissingReading,
                subject: id.clone(),
                message: format!("No {} reading submitted for {}", meter.name, period),
            });
        }
    }

    for (id, property) in properties {
        let Some(required) = property.deposit else {
            continue;
        };
        let held = deposit::current_balance(&state.deposits, id).unwrap_or(0.0);
        if held < required {
            notices.push(Notice {
                kind: NoticeKind::DepositShortfall,
                subject: id.clone(),
                message: format!(
                    "Deposit holds {} of {}",
                    format_amount(held, currency_symbol),
                    format_amount(required, currency_symbol)
                ),
            });
        }
    }

    notices.sort_by(|a, b| (a.kind, &a.subject).cmp(&(b.kind, &b.subject)));
    notices
}
