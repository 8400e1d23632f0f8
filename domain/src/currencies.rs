use crate::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Decimal places used when a currency is created without an explicit value.
pub const DEFAULT_DECIMALS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyType {
    Fiat,
    Crypto,
}

impl FromStr for CurrencyType {
    type Err = String;
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "fiat" => Ok(CurrencyType::Fiat),
            "crypto" => Ok(CurrencyType::Crypto),
            other => Err(format!("Unknown currency type: {other}")),
        }
    }
}

impl fmt::Display for CurrencyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CurrencyType::Fiat => write!(f, "fiat"),
            CurrencyType::Crypto => write!(f, "crypto"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = domain::currencies::Model)]
pub struct Model {
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    /// ISO-4217 style code, unique across currencies (e.g. `USD`, `BTC`).
    pub code: String,
    pub name: String,
    pub symbol: String,
    /// Emoji flag or short label shown next to the code.
    pub flag: String,
    pub flag_url: Option<String>,
    #[serde(rename = "type")]
    pub currency_type: CurrencyType,
    pub decimals: u8,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
