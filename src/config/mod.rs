mod landlord;
mod meter;
mod property;
pub mod state;

pub use landlord::{BillingSettings, Config, Landlord};
pub use meter::{CollectionMode, DistributionMethod, Meter, MeterKind, MeterScope, MeterUnit};
pub use property::Property;
pub use state::{DepositEvent, DepositKind, InvoiceEntry, Payment, Reading, State, UtilityLine};

use crate::error::{LedgerError, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (XDG config dir, or ~/.rentledger/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "rentledger") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = std::env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
        LedgerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".rentledger"))
}

fn load_toml<T: DeserializeOwned>(path: PathBuf) -> Result<T> {
    if !path.exists() {
        return Err(LedgerError::ConfigFileNotFound(path));
    }
    tracing::debug!(path = %path.display(), "Loading config file");
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| LedgerError::ConfigParse { path, source: e })
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    load_toml(config_dir.join("config.toml"))
}

/// Load properties.toml keyed by property id
pub fn load_properties(config_dir: &Path) -> Result<HashMap<String, Property>> {
    load_toml(config_dir.join("properties.toml"))
}

/// Load meters.toml keyed by meter id
pub fn load_meters(config_dir: &Path) -> Result<HashMap<String, Meter>> {
    load_toml(config_dir.join("meters.toml"))
}

/// Load state.toml (default state if missing)
pub fn load_state(config_dir: &Path) -> Result<State> {
    let path = config_dir.join("state.toml");
    if !path.exists() {
        return Ok(State::default());
    }
    load_toml(path)
}

/// Save state.toml
pub fn save_state(config_dir: &Path, state: &State) -> Result<()> {
    let path = config_dir.join("state.toml");
    let content = toml::to_string_pretty(state)?;
    fs::write(&path, content)?;
    tracing::debug!(path = %path.display(), "Saved state");
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[landlord]
name = "Your Name"
email = "landlord@example.com"
# phone = "+370 600 00000"    # optional

[billing]
number_format = "RENT-{year}-{seq:04}"  # e.g., RENT-2026-0001
currency_symbol = "€"
due_days = 14
"#;

/// Template content for properties.toml
pub const PROPERTIES_TEMPLATE: &str = r#"# Define your properties here. The table name (e.g., [flat-12]) is the
# property identifier used by the other commands.
#
# Example:
#   rentledger invoice create flat-12 --period 2026-10

[flat-12]
name = "Flat 12"
address = "Gedimino pr. 1-12, Vilnius"
rent = 650.00
apartment_count = 24    # apartments sharing the building's communal meters
deposit = 1300.00       # optional
tenant = "Example Tenant"  # optional
"#;

/// Template content for meters.toml
pub const METERS_TEMPLATE: &str = r#"# Define utility meters here. The table name is the meter identifier.
#
# kind:         water_cold, water_hot, electricity_individual, electricity_common,
#               heating, gas, internet, waste, custom
# scope:        individual (one apartment) or communal (shared by the building)
# unit:         m3, kwh or currency (price only)
# distribution: per_apartment, per_area, per_person, per_consumption, fixed_split
# collection:   landlord or tenant_photo
#
# Individual meters must use per_consumption. Fixed-split meters take a
# fixed_price and no price_per_unit.

[flat-12-cold-water]
name = "Cold water"
property = "flat-12"
kind = "water_cold"
scope = "individual"
unit = "m3"
price_per_unit = 1.50
distribution = "per_consumption"
requires_photo = true
collection = "tenant_photo"

[flat-12-stairwell]
name = "Stairwell electricity"
property = "flat-12"
kind = "electricity_common"
scope = "communal"
unit = "kwh"
price_per_unit = 0.22
distribution = "per_apartment"

[flat-12-waste]
name = "Waste collection"
property = "flat-12"
kind = "waste"
scope = "communal"
unit = "currency"
fixed_price = 120.00
distribution = "fixed_split"
"#;
