use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use rentledger::billing::{
    ensure_meter_valid, ensure_meters_valid, validate_meter, validate_reading, UtilityCost,
};
use rentledger::config::{
    config_dir, load_config, load_meters, load_properties, load_state, save_state,
    DepositKind, InvoiceEntry, Payment, Reading, CONFIG_TEMPLATE, METERS_TEMPLATE,
    PROPERTIES_TEMPLATE,
};
use rentledger::error::{LedgerError, Result};
use rentledger::invoice::statement::{previous_reading, utilities_total};
use rentledger::invoice::{create_invoice, next_number, period_costs, MeterCost, Period};
use rentledger::ledger::{deposit, InvoiceStatus, Reconciliation};
use rentledger::money::{format_amount, format_grouped_int};
use rentledger::notices::collect_notices;

#[derive(Parser)]
#[command(name = "rentledger")]
#[command(
    version,
    about = "Landlord ledger for rent invoices, utility meters and deposits",
    long_about = None
)]
struct Cli {
    /// Path to config directory (default: ~/.rentledger or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// Show ledger status and next invoice number
    Status,

    /// List configured properties
    Properties,

    /// List configured utility meters
    Meters {
        /// Only show meters of this property
        #[arg(short, long)]
        property: Option<String>,
    },

    /// Check every meter definition
    Validate,

    /// Record meter readings
    Reading {
        #[command(subcommand)]
        action: ReadingCommand,
    },

    /// Show reading history for a meter
    Readings {
        /// Meter identifier from meters.toml
        meter: String,
    },

    /// Show apportioned utility costs of a property for a billing period
    Costs {
        /// Property identifier from properties.toml
        property: String,

        /// Billing period YYYY-MM (default: current month)
        #[arg(long)]
        period: Option<String>,
    },

    /// Issue and inspect invoices
    Invoice {
        #[command(subcommand)]
        action: InvoiceCommand,
    },

    /// List issued invoices
    List {
        /// Number of invoices to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only show invoices of this property
        #[arg(short, long)]
        property: Option<String>,

        /// Filter by status (paid, unpaid, overdue)
        #[arg(long)]
        status: Option<String>,

        /// Evaluate due dates as of this date (default: today)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Record a payment against an invoice
    AddPayment {
        /// Invoice number or index from 'list' (e.g., 1 or RENT-2026-0001)
        invoice: String,

        /// Payment amount
        amount: f64,

        /// Payment date (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Remove a payment from an invoice
    RemovePayment {
        /// Invoice number or index from 'list' (e.g., 1 or RENT-2026-0001)
        invoice: String,

        /// 1-based index of payment to remove (default: last)
        #[arg(long)]
        index: Option<usize>,
    },

    /// Show payment history for an invoice
    Payments {
        /// Invoice number or index from 'list' (e.g., 1 or RENT-2026-0001)
        invoice: String,
    },

    /// Security deposit journal
    Deposit {
        #[command(subcommand)]
        action: DepositCommand,
    },

    /// Show overdue invoices, missing readings and deposit shortfalls
    Notices {
        /// Evaluate as of this date (default: today)
        #[arg(long)]
        as_of: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReadingCommand {
    /// Record a new reading
    Add {
        /// Meter identifier from meters.toml
        meter: String,

        /// Meter value
        value: f64,

        /// Reading date (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Previous value (default: the meter's latest earlier reading)
        #[arg(long)]
        previous: Option<f64>,

        /// Photo of the meter, required for photo-collected meters
        #[arg(long)]
        photo: Option<String>,
    },
}

#[derive(Subcommand)]
enum InvoiceCommand {
    /// Issue an invoice for rent and utilities of a period
    Create {
        /// Property identifier from properties.toml
        property: String,

        /// Billing period YYYY-MM (default: current month)
        #[arg(long)]
        period: Option<String>,

        /// Issue date (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Other charges added to the invoice
        #[arg(long, default_value_t = 0.0)]
        other: f64,
    },

    /// Show an invoice with its utility lines and balance
    Show {
        /// Invoice number or index from 'list'
        invoice: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,

        /// Evaluate the due date as of this date (default: today)
        #[arg(long)]
        as_of: Option<String>,
    },
}

#[derive(Subcommand)]
enum DepositCommand {
    /// Append an event to a property's deposit journal
    Record {
        /// Property identifier from properties.toml
        property: String,

        /// Event kind: received, adjustment or refund
        kind: String,

        /// Amount (adjustments may be negative)
        #[arg(allow_negative_numbers = true)]
        amount: f64,

        /// Starting balance when the property has no events yet
        #[arg(long)]
        baseline: Option<f64>,

        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },

    /// Show a property's deposit journal, newest first
    History {
        /// Property identifier from properties.toml
        property: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    if !matches!(cli.command, Commands::Init) && !cfg_dir.exists() {
        return Err(LedgerError::ConfigNotFound(cfg_dir));
    }

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::Properties => cmd_properties(&cfg_dir),
        Commands::Meters { property } => cmd_meters(&cfg_dir, property.as_deref()),
        Commands::Validate => cmd_validate(&cfg_dir),
        Commands::Reading {
            action:
                ReadingCommand::Add {
                    meter,
                    value,
                    date,
                    previous,
                    photo,
                },
        } => cmd_add_reading(&cfg_dir, &meter, value, date, previous, photo),
        Commands::Readings { meter } => cmd_readings(&cfg_dir, &meter),
        Commands::Costs { property, period } => cmd_costs(&cfg_dir, &property, period),
        Commands::Invoice { action } => match action {
            InvoiceCommand::Create {
                property,
                period,
                date,
                other,
            } => cmd_create_invoice(&cfg_dir, &property, period, date, other),
            InvoiceCommand::Show {
                invoice,
                json,
                as_of,
            } => cmd_show_invoice(&cfg_dir, &invoice, json, as_of),
        },
        Commands::List {
            limit,
            property,
            status,
            as_of,
        } => cmd_invoices(&cfg_dir, limit, property, status, as_of),
        Commands::AddPayment {
            invoice,
            amount,
            date,
        } => cmd_add_payment(&cfg_dir, &invoice, amount, date),
        Commands::RemovePayment { invoice, index } => {
            cmd_remove_payment(&cfg_dir, &invoice, index)
        }
        Commands::Payments { invoice } => cmd_payments(&cfg_dir, &invoice),
        Commands::Deposit { action } => match action {
            DepositCommand::Record {
                property,
                kind,
                amount,
                baseline,
                note,
            } => cmd_deposit_record(&cfg_dir, &property, &kind, amount, baseline, note),
            DepositCommand::History { property } => cmd_deposit_history(&cfg_dir, &property),
        },
        Commands::Notices { as_of } => cmd_notices(&cfg_dir, as_of),
    }
}

/// Parse a YYYY-MM-DD flag, defaulting to today
fn parse_date(flag: &'static str, value: Option<String>) -> Result<NaiveDate> {
    match value {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|_| LedgerError::InvalidDate { flag, value: s }),
        None => Ok(Local::now().date_naive()),
    }
}

fn parse_period(value: Option<String>) -> Result<Period> {
    match value {
        Some(s) => Period::parse(&s),
        None => Ok(Period::containing(Local::now().date_naive())),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(LedgerError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    fs::write(cfg_dir.join("properties.toml"), PROPERTIES_TEMPLATE)?;
    fs::write(cfg_dir.join("meters.toml"), METERS_TEMPLATE)?;
    tracing::info!(path = %cfg_dir.display(), "Initialized config directory");

    println!("Initialized rentledger config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit landlord and billing details:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Add your properties:                $EDITOR {}/properties.toml",
        cfg_dir.display()
    );
    println!(
        "  3. Configure utility meters:           $EDITOR {}/meters.toml",
        cfg_dir.display()
    );
    println!();
    println!("Then record readings and issue your first invoice:");
    println!("  rentledger reading add <meter-id> <value> --photo <file>");
    println!("  rentledger invoice create <property-id> --period <YYYY-MM>");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct PropertyRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ADDRESS")]
    address: String,
    #[tabled(rename = "TENANT")]
    tenant: String,
    #[tabled(rename = "RENT")]
    rent: String,
    #[tabled(rename = "DEPOSIT HELD")]
    deposit: String,
}

#[derive(Tabled)]
struct MeterRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "PROPERTY")]
    property: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "SCOPE")]
    scope: String,
    #[tabled(rename = "DISTRIBUTION")]
    distribution: String,
    #[tabled(rename = "PRICE")]
    price: String,
}

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "VALUE")]
    value: String,
    #[tabled(rename = "PREVIOUS")]
    previous: String,
    #[tabled(rename = "PHOTO")]
    photo: String,
}

#[derive(Tabled)]
struct CostRow {
    #[tabled(rename = "METER")]
    meter: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "READING")]
    reading: String,
    #[tabled(rename = "CONSUMPTION")]
    consumption: String,
    #[tabled(rename = "COST")]
    cost: String,
}

#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "PERIOD")]
    period: String,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "PROPERTY")]
    property: String,
}

#[derive(Tabled)]
struct PaymentRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
}

#[derive(Tabled)]
struct DepositRow {
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "BALANCE")]
    balance: String,
    #[tabled(rename = "NOTE")]
    note: String,
}

#[derive(Tabled)]
struct NoticeRow {
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "SUBJECT")]
    subject: String,
    #[tabled(rename = "MESSAGE")]
    message: String,
}

fn format_whole_money(value: f64, currency_symbol: &str) -> String {
    let rounded = value.round() as i64;
    let grouped = format_grouped_int(rounded);
    format!("{}{:>6}", currency_symbol, grouped)
}

fn format_quantity(value: f64) -> String {
    let text = format!("{:.3}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Append TOTAL / PAID / OUTSTANDING rows under the TOTAL column of the invoice table.
/// The first three columns merge into a label cell; STATUS and PROPERTY close off.
fn add_financial_footer(table: &str, total: &str, paid: &str, outstanding: &str) -> String {
    let lines: Vec<&str> = table.lines().collect();
    if lines.len() < 4 {
        return table.to_string();
    }

    // Parse the top border to discover column widths
    let top = lines[0];
    let Some(inner) = top.strip_prefix('╭').and_then(|s| s.strip_suffix('╮')) else {
        return table.to_string();
    };

    let widths: Vec<usize> = inner.split('┬').map(|p| p.chars().count()).collect();
    if widths.len() < 6 {
        return table.to_string();
    }

    let left_width = widths[0] + widths[1] + widths[2] + 2; // two ┴ become part of the label cell
    let total_width = widths[3];

    let rows = [
        ("TOTAL", total),
        ("(-) PAID", paid),
        ("(=) OUTSTANDING", outstanding),
    ];

    let mut out = lines[..lines.len() - 1].join("\n");
    out.push('\n');

    out.push_str(&format!(
        "├{}┴{}┴{}┼{}┼{}┴{}╯\n",
        "─".repeat(widths[0]),
        "─".repeat(widths[1]),
        "─".repeat(widths[2]),
        "─".repeat(total_width),
        "─".repeat(widths[4]),
        "─".repeat(widths[5]),
    ));

    for (idx, (label, value)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "│ {:>left$} │ {:>total$} │\n",
            label,
            value,
            left = left_width - 2,
            total = total_width - 2
        ));
        if idx < rows.len() - 1 {
            out.push_str(&format!(
                "├{}┼{}┤\n",
                "─".repeat(left_width),
                "─".repeat(total_width)
            ));
        }
    }

    out.push_str(&format!(
        "╰{}┴{}╯",
        "─".repeat(left_width),
        "─".repeat(total_width)
    ));

    out
}

/// Show ledger status
fn cmd_status(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let properties = load_properties(cfg_dir)?;
    let meters = load_meters(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let today = Local::now().date_naive();
    let symbol = &config.billing.currency_symbol;

    let year = today.year() as u32;
    let upcoming = match next_number(
        &config.billing.number_format,
        &state.counter,
        &state.invoices,
        year,
    ) {
        Ok((_, number)) => number,
        Err(e) => e.to_string(),
    };

    let open: Vec<(&InvoiceEntry, Reconciliation)> = state
        .invoices
        .iter()
        .map(|e| (e, e.reconcile(today)))
        .filter(|(_, r)| r.status != InvoiceStatus::Paid)
        .collect();
    let outstanding: f64 = open.iter().map(|(_, r)| r.balance).sum();
    let overdue = open
        .iter()
        .filter(|(_, r)| r.status == InvoiceStatus::Overdue)
        .count();

    println!("Ledger Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Landlord:         {}", config.landlord.name);
    println!("Properties:       {}", properties.len());
    println!("Meters:           {}", meters.len());
    println!("Readings:         {}", state.readings.len());
    println!("Next invoice:     {}", upcoming);
    println!(
        "Open invoices:    {} ({} overdue, {} outstanding)",
        open.len(),
        overdue,
        format_amount(outstanding, symbol)
    );

    if !state.invoices.is_empty() {
        println!();
        println!("Recent invoices:");
        for entry in state.invoices.iter().rev().take(5) {
            println!(
                "  {} - {} - {} - {}",
                entry.number,
                entry.property,
                entry.period,
                format_amount(entry.amount, symbol)
            );
        }
    }

    Ok(())
}

/// List configured properties
fn cmd_properties(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let properties = load_properties(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let symbol = &config.billing.currency_symbol;

    if properties.is_empty() {
        println!("No properties configured.");
        println!("Add properties to: {}/properties.toml", cfg_dir.display());
        return Ok(());
    }

    let mut sorted: Vec<_> = properties.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    let rows: Vec<PropertyRow> = sorted
        .iter()
        .map(|(id, property)| PropertyRow {
            id: id.to_string(),
            name: property.name.clone(),
            address: property.address.clone(),
            tenant: property.tenant.clone().unwrap_or_else(|| "-".to_string()),
            rent: format_amount(property.rent, symbol),
            deposit: deposit::current_balance(&state.deposits, id)
                .map(|b| format_amount(b, symbol))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// List configured meters
fn cmd_meters(cfg_dir: &Path, property: Option<&str>) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let meters = load_meters(cfg_dir)?;

    let mut sorted: Vec<_> = meters
        .iter()
        .filter(|(_, m)| property.map_or(true, |p| m.property == p))
        .collect();
    sorted.sort_by_key(|(k, _)| *k);

    if sorted.is_empty() {
        println!("No meters configured.");
        println!("Add meters to: {}/meters.toml", cfg_dir.display());
        return Ok(());
    }

    let rows: Vec<MeterRow> = sorted
        .iter()
        .map(|(id, meter)| MeterRow {
            id: id.to_string(),
            name: meter.name.clone(),
            property: meter.property.clone(),
            kind: meter.kind.to_string(),
            scope: meter.scope.to_string(),
            distribution: meter.distribution.to_string(),
            price: match meter.display_price() {
                Some(p) if meter.is_fixed() => {
                    format!("{}/month", format_amount(p, &config.billing.currency_symbol))
                }
                Some(p) => format!(
                    "{}/{}",
                    format_amount(p, &config.billing.currency_symbol),
                    meter.unit
                ),
                None => "-".to_string(),
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// Validate every meter, printing warnings; fails on the first invalid meter
fn cmd_validate(cfg_dir: &Path) -> Result<()> {
    let properties = load_properties(cfg_dir)?;
    let meters = load_meters(cfg_dir)?;

    let mut sorted: Vec<_> = meters.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    let mut first_invalid: Option<(String, String)> = None;
    for (id, meter) in &sorted {
        let report = validate_meter(meter);
        for warning in &report.warnings {
            println!("  warning  {id}: {warning}");
        }
        for error in &report.errors {
            println!("  error    {id}: {error}");
        }
        if !properties.contains_key(&meter.property) {
            println!("  error    {id}: property: unknown property '{}'", meter.property);
            first_invalid.get_or_insert_with(|| {
                (id.to_string(), format!("property: unknown property '{}'", meter.property))
            });
        }
        if !report.is_valid() {
            first_invalid.get_or_insert_with(|| (id.to_string(), report.error_summary()));
        }
    }

    if let Some((meter, issues)) = first_invalid {
        return Err(LedgerError::InvalidMeter { meter, issues });
    }

    println!("All {} meter(s) valid", sorted.len());
    Ok(())
}

/// Record a meter reading
fn cmd_add_reading(
    cfg_dir: &Path,
    meter_id: &str,
    value: f64,
    date: Option<String>,
    previous: Option<f64>,
    photo: Option<String>,
) -> Result<()> {
    let meters = load_meters(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;

    let meter = meters
        .get(meter_id)
        .ok_or_else(|| LedgerError::MeterNotFound(meter_id.to_string()))?;
    ensure_meter_valid(meter_id, meter)?;
    let date = parse_date("--date", date)?;

    let previous = previous
        .or_else(|| previous_reading(&state.readings, meter_id, date).map(|r| r.value));

    let report = validate_reading(meter, value, previous, photo.as_deref());
    if !report.is_valid() {
        return Err(LedgerError::InvalidReading {
            meter: meter_id.to_string(),
            issues: report.error_summary(),
        });
    }
    for warning in &report.warnings {
        tracing::debug!(meter = meter_id, %warning, "Reading accepted with warning");
        eprintln!("Warning: {warning}");
    }

    state.readings.push(Reading {
        meter: meter_id.to_string(),
        date,
        value,
        previous,
        photo,
    });
    save_state(cfg_dir, &state)?;
    tracing::info!(meter = meter_id, %date, value, "Recorded reading");

    println!(
        "Recorded reading {} for {} on {}",
        format_quantity(value),
        meter_id,
        date
    );
    if let Some(previous) = previous {
        println!(
            "  Consumption: {} {}",
            format_quantity(rentledger::billing::consumption(previous, value)),
            meter.unit
        );
    }

    Ok(())
}

/// Show reading history for a meter
fn cmd_readings(cfg_dir: &Path, meter_id: &str) -> Result<()> {
    let meters = load_meters(cfg_dir)?;
    let state = load_state(cfg_dir)?;

    if !meters.contains_key(meter_id) {
        return Err(LedgerError::MeterNotFound(meter_id.to_string()));
    }

    let mut readings: Vec<&Reading> = state
        .readings
        .iter()
        .filter(|r| r.meter == meter_id)
        .collect();

    println!("Readings for {}", meter_id);
    if readings.is_empty() {
        println!("  No readings recorded.");
        return Ok(());
    }
    readings.sort_by(|a, b| b.date.cmp(&a.date));

    let rows: Vec<ReadingRow> = readings
        .iter()
        .map(|r| ReadingRow {
            date: r.date.to_string(),
            value: format_quantity(r.value),
            previous: r
                .previous
                .map(format_quantity)
                .unwrap_or_else(|| "-".to_string()),
            photo: r.photo.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// Show utility costs of a property for a period
fn cmd_costs(cfg_dir: &Path, property_id: &str, period: Option<String>) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let properties = load_properties(cfg_dir)?;
    let meters = load_meters(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let symbol = &config.billing.currency_symbol;

    let property = properties
        .get(property_id)
        .ok_or_else(|| LedgerError::PropertyNotFound(property_id.to_string()))?;
    let period = parse_period(period)?;
    ensure_meters_valid(property_id, &meters)?;

    let costs = period_costs(property_id, property, &meters, &state.readings, period);
    if costs.is_empty() {
        println!("No meters configured for '{}'.", property_id);
        return Ok(());
    }

    let rows: Vec<CostRow> = costs
        .iter()
        .map(|c| CostRow {
            meter: c.id.to_string(),
            name: c.meter.name.clone(),
            reading: match c.reading {
                Some(pair) => match pair.previous {
                    Some(previous) => format!(
                        "{} -> {}",
                        format_quantity(previous),
                        format_quantity(pair.current)
                    ),
                    None => format_quantity(pair.current),
                },
                None => "-".to_string(),
            },
            consumption: c
                .cost
                .consumption()
                .map(|q| format!("{} {}", format_quantity(q), c.meter.unit))
                .unwrap_or_else(|| "-".to_string()),
            cost: match c.cost {
                UtilityCost::Pending => "pending".to_string(),
                UtilityCost::Fixed { cost } => format!("{} (fixed)", format_amount(cost, symbol)),
                UtilityCost::Measured { cost, .. } => format_amount(cost, symbol),
            },
        })
        .collect();

    let lines: Vec<_> = costs.iter().map(MeterCost::to_line).collect();
    let pending = lines.iter().filter(|l| l.cost.is_none()).count();

    println!("Utility costs for {} ({})", property_id, period);
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!(
        "Utilities: {} ({} pending)",
        format_amount(utilities_total(&lines), symbol),
        pending
    );

    Ok(())
}

/// Issue a new invoice
fn cmd_create_invoice(
    cfg_dir: &Path,
    property_id: &str,
    period: Option<String>,
    date: Option<String>,
    other: f64,
) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let symbol = &config.billing.currency_symbol;
    let period = parse_period(period)?;
    let date = parse_date("--date", date)?;

    let invoice = create_invoice(cfg_dir, property_id, period, date, other)?;
    let pending: Vec<&str> = invoice
        .lines
        .iter()
        .filter(|l| l.cost.is_none())
        .map(|l| l.meter.as_str())
        .collect();

    println!("Issued {}", invoice.number);
    println!("  Property:  {}", invoice.property);
    println!("  Period:    {}", invoice.period);
    println!("  Rent:      {}", format_amount(invoice.rent, symbol));
    println!("  Utilities: {}", format_amount(invoice.utilities, symbol));
    if invoice.other != 0.0 {
        println!("  Other:     {}", format_amount(invoice.other, symbol));
    }
    println!("  Total:     {}", format_amount(invoice.amount, symbol));
    println!("  Due:       {}", invoice.due_date);
    if !pending.is_empty() {
        println!("  Pending:   {} (not billed)", pending.join(", "));
    }

    Ok(())
}

#[derive(Serialize)]
struct InvoiceView<'a> {
    #[serde(flatten)]
    invoice: &'a InvoiceEntry,
    #[serde(flatten)]
    reconciliation: Reconciliation,
}

/// Show a single invoice
fn cmd_show_invoice(
    cfg_dir: &Path,
    invoice_ref: &str,
    json: bool,
    as_of: Option<String>,
) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let symbol = &config.billing.currency_symbol;
    let today = parse_date("--as-of", as_of)?;

    let invoice_number = resolve_invoice_number(&state.invoices, invoice_ref)?;
    let entry = find_invoice(&state.invoices, &invoice_number)?;
    let reconciliation = entry.reconcile(today);

    if json {
        let view = InvoiceView {
            invoice: entry,
            reconciliation,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Invoice {}", entry.number);
    println!("{}", "-".repeat(50));
    println!("Property:  {}", entry.property);
    println!("Period:    {}", entry.period);
    println!("Issued:    {}", entry.date);
    println!("Due:       {}", entry.due_date);
    println!("Rent:      {}", format_amount(entry.rent, symbol));
    for line in &entry.lines {
        let cost = line
            .cost
            .map(|c| format_amount(c, symbol))
            .unwrap_or_else(|| "pending".to_string());
        println!("  {:<28} {}", line.name, cost);
    }
    println!("Utilities: {}", format_amount(entry.utilities, symbol));
    if entry.other != 0.0 {
        println!("Other:     {}", format_amount(entry.other, symbol));
    }
    println!("Total:     {}", format_amount(entry.amount, symbol));
    println!("Paid:      {}", format_amount(reconciliation.paid_amount, symbol));
    println!("Balance:   {}", format_amount(reconciliation.balance, symbol));
    println!("Status:    {}", reconciliation.status);

    Ok(())
}

/// List invoices with derived status
fn cmd_invoices(
    cfg_dir: &Path,
    limit: Option<usize>,
    property: Option<String>,
    status: Option<String>,
    as_of: Option<String>,
) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let symbol = &config.billing.currency_symbol;
    let today = parse_date("--as-of", as_of)?;
    let status_filter = status
        .as_deref()
        .map(str::parse::<InvoiceStatus>)
        .transpose()?;

    if state.invoices.is_empty() {
        println!("No invoices issued yet.");
        return Ok(());
    }

    // Indices stay stable under filtering so they can be passed to other commands
    let invoices: Vec<(usize, &InvoiceEntry, Reconciliation)> = state
        .invoices
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, e)| (idx, e, e.reconcile(today)))
        .filter(|(_, e, _)| property.as_deref().map_or(true, |p| e.property == p))
        .filter(|(_, _, r)| status_filter.map_or(true, |s| r.status == s))
        .collect();
    let invoices = match limit {
        Some(n) => &invoices[..n.min(invoices.len())],
        None => &invoices[..],
    };

    if invoices.is_empty() {
        println!("No invoices match the given filters.");
        return Ok(());
    }

    let rows: Vec<InvoiceRow> = invoices
        .iter()
        .map(|(idx, entry, r)| InvoiceRow {
            index: idx + 1,
            number: entry.number.clone(),
            period: entry.period.clone(),
            total: format_whole_money(entry.amount, symbol),
            status: r.status.to_string(),
            property: entry.property.clone(),
        })
        .collect();

    let shown_total: f64 = invoices.iter().map(|(_, e, _)| e.amount).sum();
    let shown_paid: f64 = invoices.iter().map(|(_, _, r)| r.paid_amount).sum();
    let shown_outstanding = shown_total - shown_paid;

    let table = Table::new(rows).with(Style::rounded()).to_string();
    let table = add_financial_footer(
        &table,
        &format_whole_money(shown_total, symbol),
        &format_whole_money(shown_paid, symbol),
        &format_whole_money(shown_outstanding, symbol),
    );

    println!("{table}");
    println!();
    println!("Total: {} invoices", state.invoices.len());
    println!(
        "Use index number with show/add-payment/remove-payment/payments (e.g., 'rentledger payments 1')"
    );

    Ok(())
}

/// Resolve an invoice reference to the actual invoice number.
/// Accepts either an index (1-based) from 'list' or the full invoice number.
/// An exact number match wins, so numeric formats like "001" still resolve.
fn resolve_invoice_number(invoices: &[InvoiceEntry], reference: &str) -> Result<String> {
    if invoices.iter().any(|e| e.number == reference) {
        return Ok(reference.to_string());
    }

    if let Ok(idx) = reference.parse::<usize>() {
        if idx == 0 || idx > invoices.len() {
            return Err(LedgerError::InvalidInvoiceIndex(reference.to_string()));
        }
        // Invoices are listed newest first
        return Ok(invoices[invoices.len() - idx].number.clone());
    }

    Err(LedgerError::InvoiceNotFound(reference.to_string()))
}

fn find_invoice<'a>(invoices: &'a [InvoiceEntry], number: &str) -> Result<&'a InvoiceEntry> {
    invoices
        .iter()
        .find(|e| e.number == number)
        .ok_or_else(|| LedgerError::InvoiceNotFound(number.to_string()))
}

fn find_invoice_mut<'a>(
    invoices: &'a mut [InvoiceEntry],
    number: &str,
) -> Result<&'a mut InvoiceEntry> {
    invoices
        .iter_mut()
        .find(|e| e.number == number)
        .ok_or_else(|| LedgerError::InvoiceNotFound(number.to_string()))
}

/// Record a payment against an invoice
fn cmd_add_payment(
    cfg_dir: &Path,
    invoice_ref: &str,
    amount: f64,
    date: Option<String>,
) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::InvalidPaymentAmount);
    }

    let config = load_config(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;
    let symbol = &config.billing.currency_symbol;
    let date = parse_date("--date", date)?;

    let invoice_number = resolve_invoice_number(&state.invoices, invoice_ref)?;
    let entry = find_invoice_mut(&mut state.invoices, &invoice_number)?;

    let remaining = entry.reconcile(date).balance;
    if amount > remaining + 0.001 {
        return Err(LedgerError::OverPayment {
            invoice: invoice_number,
            max: remaining.max(0.0),
        });
    }

    entry.payments.push(Payment { amount, date });
    let after = entry.reconcile(date);

    save_state(cfg_dir, &state)?;
    tracing::info!(invoice = %invoice_number, amount, balance = after.balance, "Recorded payment");

    if after.status == InvoiceStatus::Paid {
        println!(
            "Recorded {} payment for {} (fully paid)",
            format_amount(amount, symbol),
            invoice_number
        );
    } else {
        println!(
            "Recorded {} payment for {} ({} remaining)",
            format_amount(amount, symbol),
            invoice_number,
            format_amount(after.balance, symbol)
        );
    }

    Ok(())
}

/// Remove a payment from an invoice
fn cmd_remove_payment(cfg_dir: &Path, invoice_ref: &str, index: Option<usize>) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;

    let invoice_number = resolve_invoice_number(&state.invoices, invoice_ref)?;
    let entry = find_invoice_mut(&mut state.invoices, &invoice_number)?;

    if entry.payments.is_empty() {
        return Err(LedgerError::NoPayments(invoice_number));
    }

    // 1-based index, default to last
    let remove_idx = match index {
        Some(i) => {
            if i == 0 || i > entry.payments.len() {
                return Err(LedgerError::InvalidPaymentIndex {
                    invoice: invoice_number,
                    index: i,
                    count: entry.payments.len(),
                });
            }
            i - 1
        }
        None => entry.payments.len() - 1,
    };

    let removed = entry.payments.remove(remove_idx);

    save_state(cfg_dir, &state)?;
    tracing::info!(invoice = %invoice_number, amount = removed.amount, "Removed payment");

    println!(
        "Removed {} payment from {}",
        format_amount(removed.amount, &config.billing.currency_symbol),
        invoice_number
    );

    Ok(())
}

/// Show payment history for an invoice
fn cmd_payments(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let symbol = &config.billing.currency_symbol;

    let invoice_number = resolve_invoice_number(&state.invoices, invoice_ref)?;
    let entry = find_invoice(&state.invoices, &invoice_number)?;
    let reconciliation = entry.reconcile(Local::now().date_naive());

    println!("Payments for {}", invoice_number);

    if entry.payments.is_empty() {
        println!("  No payments recorded.");
    } else {
        let rows: Vec<PaymentRow> = entry
            .payments
            .iter()
            .enumerate()
            .map(|(idx, p)| PaymentRow {
                index: idx + 1,
                date: p.date.to_string(),
                amount: format_amount(p.amount, symbol),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    println!(
        "Total paid: {} / {} (balance {}, status {})",
        format_amount(reconciliation.paid_amount, symbol),
        format_amount(entry.amount, symbol),
        format_amount(reconciliation.balance, symbol),
        reconciliation.status
    );

    Ok(())
}

/// Append a deposit journal event
fn cmd_deposit_record(
    cfg_dir: &Path,
    property_id: &str,
    kind: &str,
    amount: f64,
    baseline: Option<f64>,
    note: Option<String>,
) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let properties = load_properties(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;
    let symbol = &config.billing.currency_symbol;

    if !properties.contains_key(property_id) {
        return Err(LedgerError::PropertyNotFound(property_id.to_string()));
    }
    let kind: DepositKind = kind.parse()?;

    let event = deposit::record(
        &mut state.deposits,
        property_id,
        kind,
        amount,
        baseline,
        note,
        Utc::now(),
    )?;
    save_state(cfg_dir, &state)?;

    println!(
        "Recorded {} of {} for {} (balance {})",
        event.kind,
        format_amount(event.amount, symbol),
        property_id,
        format_amount(event.balance_after, symbol)
    );

    Ok(())
}

/// Show the deposit journal of a property
fn cmd_deposit_history(cfg_dir: &Path, property_id: &str) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let properties = load_properties(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let symbol = &config.billing.currency_symbol;

    let property = properties
        .get(property_id)
        .ok_or_else(|| LedgerError::PropertyNotFound(property_id.to_string()))?;

    let events = deposit::history(&state.deposits, property_id);
    println!("Deposit journal for {}", property_id);

    if events.is_empty() {
        println!("  No deposit events recorded.");
        return Ok(());
    }

    let rows: Vec<DepositRow> = events
        .iter()
        .map(|e| DepositRow {
            date: e.created_at.format("%Y-%m-%d %H:%M").to_string(),
            kind: e.kind.to_string(),
            amount: format_amount(deposit::signed_amount(e.kind, e.amount), symbol),
            balance: format_amount(e.balance_after, symbol),
            note: e.note.clone().unwrap_or_default(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    let balance = events[0].balance_after;
    match property.deposit {
        Some(required) => println!(
            "Current balance: {} (contract: {})",
            format_amount(balance, symbol),
            format_amount(required, symbol)
        ),
        None => println!("Current balance: {}", format_amount(balance, symbol)),
    }

    Ok(())
}

/// Show notices
fn cmd_notices(cfg_dir: &Path, as_of: Option<String>) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let properties = load_properties(cfg_dir)?;
    let meters = load_meters(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let today = parse_date("--as-of", as_of)?;

    let notices = collect_notices(
        &properties,
        &meters,
        &state,
        today,
        &config.billing.currency_symbol,
    );

    if notices.is_empty() {
        println!("No notices.");
        return Ok(());
    }

    let rows: Vec<NoticeRow> = notices
        .into_iter()
        .map(|n| NoticeRow {
            kind: n.kind.to_string(),
            subject: n.subject,
            message: n.message,
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}
