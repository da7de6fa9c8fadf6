use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Property {
    pub name: String,
    pub address: String,
    /// Monthly rent
    pub rent: f64,
    /// Apartments sharing the building's communal meters
    #[serde(default)]
    pub apartment_count: Option<u32>,
    /// Contractual security deposit
    #[serde(default)]
    pub deposit: Option<f64>,
    #[serde(default)]
    pub tenant: Option<String>,
}
