mod generator;
pub mod statement;

pub use generator::{
    build_invoice, create_invoice, format_invoice_number, next_number, next_sequence,
};
pub use statement::{period_costs, reading_pair, MeterCost, Period};
