pub mod deposit;
mod reconcile;

pub use reconcile::{reconcile, InvoiceStatus, Reconciliation};
