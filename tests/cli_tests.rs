use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn rentledger_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("rentledger"))
}

/// Initialize a fresh config directory from the templates
fn init_config(temp_dir: &TempDir) -> PathBuf {
    let config_path = temp_dir.path().join("ledger-config");
    rentledger_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    config_path
}

fn run(config_path: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    rentledger_cmd()
        .args(["-C", config_path.to_str().unwrap()])
        .args(args)
        .assert()
}

fn write_state(config_path: &Path, state: &str) {
    fs::write(config_path.join("state.toml"), state).unwrap();
}

const ONE_INVOICE_STATE: &str = r#"[counter]
last_number = 1
last_year = 2026

[[invoices]]
number = "RENT-2026-0001"
property = "flat-12"
period = "2026-09"
date = "2026-10-01"
due_date = "2026-10-15"
rent = 100.0
amount = 100.0
"#;

#[test]
fn test_help() {
    rentledger_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Landlord ledger for rent invoices, utility meters and deposits",
        ));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ledger-config");

    rentledger_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized rentledger config"));

    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("properties.toml").exists());
    assert!(config_path.join("meters.toml").exists());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run(&config_path, &["init"])
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    run(&config_path, &["status"])
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_status() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run(&config_path, &["status"])
        .success()
        .stdout(predicate::str::contains("Ledger Status"))
        .stdout(predicate::str::contains("Meters:           3"))
        .stdout(predicate::str::contains("Next invoice:     RENT-"));
}

#[test]
fn test_properties_and_meters_list() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run(&config_path, &["properties"])
        .success()
        .stdout(predicate::str::contains("flat-12"))
        .stdout(predicate::str::contains("€650.00"));

    run(&config_path, &["meters", "--property", "flat-12"])
        .success()
        .stdout(predicate::str::contains("flat-12-cold-water"))
        .stdout(predicate::str::contains("€1.50/m3"))
        .stdout(predicate::str::contains("€120.00/month"));
}

#[test]
fn test_templates_validate() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run(&config_path, &["validate"])
        .success()
        .stdout(predicate::str::contains("All 3 meter(s) valid"));
}

#[test]
fn test_validate_rejects_individual_meter_split_per_apartment() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    fs::write(
        config_path.join("meters.toml"),
        r#"[hall-heating]
name = "Hall heating"
property = "flat-12"
kind = "heating"
scope = "individual"
unit = "kwh"
price_per_unit = 0.10
distribution = "per_apartment"
"#,
    )
    .unwrap();

    run(&config_path, &["validate"])
        .failure()
        .stdout(predicate::str::contains("error    hall-heating: distribution"))
        .stderr(predicate::str::contains("Meter 'hall-heating' is invalid"));
}

#[test]
fn test_reading_requires_photo() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run(
        &config_path,
        &["reading", "add", "flat-12-cold-water", "100", "--date", "2026-09-30"],
    )
    .failure()
    .stderr(predicate::str::contains("requires a photo"));

    run(&config_path, &["reading", "add", "no-such-meter", "1"])
        .failure()
        .stderr(predicate::str::contains("Meter 'no-such-meter' not found"));
}

#[test]
fn test_readings_costs_and_invoice() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run(
        &config_path,
        &[
            "reading",
            "add",
            "flat-12-cold-water",
            "100",
            "--date",
            "2026-09-30",
            "--photo",
            "sep.jpg",
        ],
    )
    .success()
    .stdout(predicate::str::contains(
        "Recorded reading 100 for flat-12-cold-water on 2026-09-30",
    ));

    run(
        &config_path,
        &[
            "reading",
            "add",
            "flat-12-cold-water",
            "107",
            "--date",
            "2026-10-31",
            "--photo",
            "oct.jpg",
        ],
    )
    .success()
    .stdout(predicate::str::contains("Consumption: 7 m3"));

    run(&config_path, &["readings", "flat-12-cold-water"])
        .success()
        .stdout(predicate::str::contains("2026-10-31"))
        .stdout(predicate::str::contains("oct.jpg"));

    run(&config_path, &["costs", "flat-12", "--period", "2026-10"])
        .success()
        .stdout(predicate::str::contains("€10.50"))
        .stdout(predicate::str::contains("pending"))
        .stdout(predicate::str::contains("€5.00 (fixed)"))
        .stdout(predicate::str::contains("Utilities: €15.50 (1 pending)"));

    run(
        &config_path,
        &[
            "invoice", "create", "flat-12", "--period", "2026-10", "--date", "2026-11-01",
        ],
    )
    .success()
    .stdout(predicate::str::contains("Issued RENT-2026-0001"))
    .stdout(predicate::str::contains("Total:     €665.50"))
    .stdout(predicate::str::contains("Due:       2026-11-15"))
    .stdout(predicate::str::contains("Pending:   flat-12-stairwell"));

    run(
        &config_path,
        &[
            "invoice", "create", "flat-12", "--period", "2026-10", "--date", "2026-11-02",
        ],
    )
    .failure()
    .stderr(predicate::str::contains("already exists"));

    run(
        &config_path,
        &["invoice", "show", "1", "--json", "--as-of", "2026-11-02"],
    )
    .success()
    .stdout(predicate::str::contains("\"number\": \"RENT-2026-0001\""))
    .stdout(predicate::str::contains("\"amount\": 665.5"))
    .stdout(predicate::str::contains("\"status\": \"unpaid\""));
}

#[test]
fn test_invalid_meter_blocks_readings_costs_and_invoices() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    fs::write(
        config_path.join("meters.toml"),
        r#"[hall-water]
name = "Hall water"
property = "flat-12"
kind = "water_cold"
scope = "individual"
unit = "m3"
price_per_unit = -5.0
distribution = "per_apartment"
"#,
    )
    .unwrap();

    run(
        &config_path,
        &["reading", "add", "hall-water", "100", "--date", "2026-09-30"],
    )
    .failure()
    .stderr(predicate::str::contains("Meter 'hall-water' is invalid"));

    run(&config_path, &["costs", "flat-12", "--period", "2026-10"])
        .failure()
        .stderr(predicate::str::contains("Meter 'hall-water' is invalid"))
        .stderr(predicate::str::contains("price_per_unit: Price cannot be negative"));

    run(
        &config_path,
        &[
            "invoice", "create", "flat-12", "--period", "2026-10", "--date", "2026-11-01",
        ],
    )
    .failure()
    .stderr(predicate::str::contains("distribution: Individual meters"));

    let state = fs::read_to_string(config_path.join("state.toml")).unwrap_or_default();
    assert!(!state.contains("[[invoices]]"));
}

#[test]
fn test_backdated_invoice_keeps_numbers_unique() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    for (period, date, number) in [
        ("2026-10", "2026-11-01", "RENT-2026-0001"),
        ("2025-12", "2025-12-31", "RENT-2025-0001"),
        ("2026-11", "2026-12-01", "RENT-2026-0002"),
    ] {
        run(
            &config_path,
            &[
                "invoice", "create", "flat-12", "--period", period, "--date", date,
            ],
        )
        .success()
        .stdout(predicate::str::contains(format!("Issued {number}")));
    }

    let state = fs::read_to_string(config_path.join("state.toml")).unwrap();
    assert_eq!(state.matches("number = \"RENT-2026-0001\"").count(), 1);

    run(&config_path, &["invoice", "show", "RENT-2026-0002"])
        .success()
        .stdout(predicate::str::contains("Period:    2026-11"));
}

#[test]
fn test_numeric_invoice_numbers_resolve_before_indices() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    let config = fs::read_to_string(config_path.join("config.toml"))
        .unwrap()
        .replace("RENT-{year}-{seq:04}", "{seq:03}");
    fs::write(config_path.join("config.toml"), config).unwrap();

    for period in ["2026-09", "2026-10"] {
        run(
            &config_path,
            &[
                "invoice", "create", "flat-12", "--period", period, "--date", "2026-10-01",
            ],
        )
        .success();
    }

    // Index 1 is the newest invoice, but "001" names the first one issued
    run(&config_path, &["invoice", "show", "001"])
        .success()
        .stdout(predicate::str::contains("Invoice 001"))
        .stdout(predicate::str::contains("Period:    2026-09"));

    run(&config_path, &["invoice", "show", "1"])
        .success()
        .stdout(predicate::str::contains("Invoice 002"));
}

#[test]
fn test_invalid_period() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run(&config_path, &["costs", "flat-12", "--period", "2026-13"])
        .failure()
        .stderr(predicate::str::contains("Invalid billing period"));
}

#[test]
fn test_partial_payments_and_overdue_status() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    write_state(&config_path, ONE_INVOICE_STATE);

    run(&config_path, &["add-payment", "1", "40", "--date", "2026-10-05"])
        .success()
        .stdout(predicate::str::contains(
            "Recorded €40.00 payment for RENT-2026-0001 (€60.00 remaining)",
        ));

    run(
        &config_path,
        &["add-payment", "RENT-2026-0001", "40", "--date", "2026-10-06"],
    )
    .success()
    .stdout(predicate::str::contains("(€20.00 remaining)"));

    run(&config_path, &["list", "--as-of", "2026-10-10"])
        .success()
        .stdout(predicate::str::contains("UNPAID"))
        .stdout(predicate::str::contains("(=) OUTSTANDING"));

    run(&config_path, &["list", "--as-of", "2026-10-20"])
        .success()
        .stdout(predicate::str::contains("OVERDUE"));

    run(&config_path, &["list", "--status", "paid", "--as-of", "2026-10-20"])
        .success()
        .stdout(predicate::str::contains("No invoices match"));

    run(&config_path, &["payments", "1"])
        .success()
        .stdout(predicate::str::contains(
            "Total paid: €80.00 / €100.00 (balance €20.00",
        ));

    run(&config_path, &["add-payment", "1", "25"])
        .failure()
        .stderr(predicate::str::contains("exceed invoice balance"));

    run(&config_path, &["add-payment", "1", "20", "--date", "2026-10-25"])
        .success()
        .stdout(predicate::str::contains("(fully paid)"));

    run(&config_path, &["list", "--status", "paid", "--as-of", "2030-01-01"])
        .success()
        .stdout(predicate::str::contains("PAID"));
}

#[test]
fn test_rejects_non_finite_and_negative_amounts() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    write_state(&config_path, ONE_INVOICE_STATE);

    for amount in ["NaN", "inf", "0"] {
        run(&config_path, &["add-payment", "1", amount])
            .failure()
            .stderr(predicate::str::contains(
                "Payment amount must be greater than zero",
            ));
    }

    run(&config_path, &["payments", "1"])
        .success()
        .stdout(predicate::str::contains("No payments recorded."));

    for other in ["--other=inf", "--other=NaN", "--other=-5"] {
        run(
            &config_path,
            &["invoice", "create", "flat-12", "--period", "2026-10", other],
        )
        .failure()
        .stderr(predicate::str::contains(
            "Other charges must be a finite amount of zero or more",
        ));
    }

    run(
        &config_path,
        &[
            "invoice", "create", "flat-12", "--period", "2026-10", "--date", "2026-11-01",
            "--other", "12.5",
        ],
    )
    .success()
    .stdout(predicate::str::contains("Other:     €12.50"));
}

#[test]
fn test_remove_payment() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    write_state(&config_path, ONE_INVOICE_STATE);

    run(&config_path, &["remove-payment", "1"])
        .failure()
        .stderr(predicate::str::contains("No payments recorded"));

    run(&config_path, &["add-payment", "1", "30", "--date", "2026-10-05"]).success();

    run(&config_path, &["remove-payment", "1", "--index", "5"])
        .failure()
        .stderr(predicate::str::contains("Invalid payment index 5"));

    run(&config_path, &["remove-payment", "1"])
        .success()
        .stdout(predicate::str::contains(
            "Removed €30.00 payment from RENT-2026-0001",
        ));

    run(&config_path, &["payments", "1"])
        .success()
        .stdout(predicate::str::contains("No payments recorded."));
}

#[test]
fn test_invalid_invoice_reference() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    write_state(&config_path, ONE_INVOICE_STATE);

    run(&config_path, &["payments", "7"])
        .failure()
        .stderr(predicate::str::contains("Invalid invoice index '7'"));

    run(&config_path, &["payments", "RENT-1999-0001"])
        .failure()
        .stderr(predicate::str::contains("Invoice 'RENT-1999-0001' not found"));
}

#[test]
fn test_deposit_received_then_refunded() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run(
        &config_path,
        &[
            "deposit",
            "record",
            "flat-12",
            "received",
            "1300",
            "--note",
            "Signed lease",
        ],
    )
    .success()
    .stdout(predicate::str::contains(
        "Recorded received of €1,300.00 for flat-12 (balance €1,300.00)",
    ));

    run(&config_path, &["deposit", "record", "flat-12", "refund", "1300"])
        .success()
        .stdout(predicate::str::contains("(balance €0.00)"));

    run(&config_path, &["deposit", "record", "flat-12", "refund", "1"])
        .failure()
        .stderr(predicate::str::contains("exceeds the deposit balance"));

    run(&config_path, &["deposit", "record", "flat-12", "bonus", "1"])
        .failure()
        .stderr(predicate::str::contains("Invalid deposit kind 'bonus'"));

    run(&config_path, &["deposit", "history", "flat-12"])
        .success()
        .stdout(predicate::str::contains("Signed lease"))
        .stdout(predicate::str::contains("-€1,300.00"))
        .stdout(predicate::str::contains(
            "Current balance: €0.00 (contract: €1,300.00)",
        ));
}

#[test]
fn test_deposit_adjustment_accepts_negative_amount() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run(
        &config_path,
        &[
            "deposit",
            "record",
            "flat-12",
            "adjustment",
            "-50",
            "--baseline",
            "1300",
        ],
    )
    .success()
    .stdout(predicate::str::contains("(balance €1,250.00)"));
}

#[test]
fn test_notices() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    write_state(&config_path, ONE_INVOICE_STATE);

    run(&config_path, &["notices", "--as-of", "2026-10-20"])
        .success()
        .stdout(predicate::str::contains("RENT-2026-0001"))
        .stdout(predicate::str::contains("€100.00 overdue by 5 day(s)"))
        .stdout(predicate::str::contains(
            "No Cold water reading submitted for 2026-10",
        ))
        .stdout(predicate::str::contains("Deposit holds €0.00 of €1,300.00"));
}
