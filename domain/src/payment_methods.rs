use crate::{currencies, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where a customer sends the funds for an order: a bank account, a wallet
/// address or any other channel described by `instructions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = domain::payment_methods::Model)]
pub struct Model {
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    pub name: String,
    /// Free-form kind, e.g. `bank_transfer` or `crypto`.
    #[serde(rename = "type")]
    pub method_type: String,
    #[schema(value_type = String, format = Uuid)]
    pub currency_id: Id,
    pub active: bool,
    pub bank_name: Option<String>,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub routing_number: Option<String>,
    pub swift: Option<String>,
    pub iban: Option<String>,
    pub wallet_address: Option<String>,
    pub network: Option<String>,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    #[serde(flatten)]
    pub method: Model,
    pub currency: Option<currencies::Model>,
}
