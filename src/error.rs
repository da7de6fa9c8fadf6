use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Config directory not found at {0}. Run 'rentledger init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write state file: {0}")]
    StateWrite(#[from] toml::ser::Error),

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Property '{0}' not found in properties.toml")]
    PropertyNotFound(String),

    #[error("Meter '{0}' not found in meters.toml")]
    MeterNotFound(String),

    #[error("Meter '{meter}' is invalid: {issues}")]
    InvalidMeter { meter: String, issues: String },

    #[error("Reading for '{meter}' rejected: {issues}")]
    InvalidReading { meter: String, issues: String },

    #[error("Invalid {flag} value '{value}'. Expected YYYY-MM-DD.")]
    InvalidDate { flag: &'static str, value: String },

    #[error("Invalid billing period '{0}'. Expected YYYY-MM (e.g., 2026-10).")]
    InvalidPeriod(String),

    #[error("Invoice for '{property}' in {period} already exists ({number})")]
    InvoiceExists {
        property: String,
        period: String,
        number: String,
    },

    #[error("Invoice number '{0}' is already taken; check number_format in config.toml")]
    InvoiceNumberTaken(String),

    #[error("Other charges must be a finite amount of zero or more")]
    InvalidCharge,

    #[error("Invoice '{0}' not found in state")]
    InvoiceNotFound(String),

    #[error("Invalid invoice index '{0}'. Use 'rentledger list' to see available invoices.")]
    InvalidInvoiceIndex(String),

    #[error("Invalid --status value '{0}'. Use 'paid', 'unpaid' or 'overdue'.")]
    InvalidStatusFilter(String),

    #[error("Payment would exceed invoice balance (max {max:.2} remaining on {invoice})")]
    OverPayment { invoice: String, max: f64 },

    #[error("No payments recorded for {0}")]
    NoPayments(String),

    #[error("Invalid payment index {index} for {invoice} (only {count} payment(s) recorded)")]
    InvalidPaymentIndex {
        invoice: String,
        index: usize,
        count: usize,
    },

    #[error("Payment amount must be greater than zero")]
    InvalidPaymentAmount,

    #[error("Invalid deposit kind '{0}'. Use 'received', 'adjustment' or 'refund'.")]
    InvalidDepositKind(String),

    #[error("Deposit {kind} amount must be {requirement}")]
    InvalidDepositAmount {
        kind: &'static str,
        requirement: &'static str,
    },

    #[error("Refund of {amount:.2} exceeds the deposit balance of {balance:.2} for '{property}'")]
    RefundExceedsBalance {
        property: String,
        amount: f64,
        balance: f64,
    },

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
