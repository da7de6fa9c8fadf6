use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub landlord: Landlord,
    pub billing: BillingSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Landlord {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BillingSettings {
    pub number_format: String,
    pub currency_symbol: String,
    pub due_days: u32,
}
