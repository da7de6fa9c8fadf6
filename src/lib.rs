pub mod billing;
pub mod config;
pub mod error;
pub mod invoice;
pub mod ledger;
pub mod money;
pub mod notices;

pub use billing::{utility_cost, validate_meter, ReadingPair, UtilityCost, ValidationReport};
pub use config::{Config, DepositEvent, InvoiceEntry, Meter, Payment, Property, Reading, State};
pub use error::{LedgerError, Result};
pub use invoice::{create_invoice, Period};
pub use ledger::{reconcile, InvoiceStatus, Reconciliation};
