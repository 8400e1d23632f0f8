use crate::{currencies, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = domain::exchange_rates::Model)]
pub struct Model {
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub from_currency_id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub to_currency_id: Id,
    pub rate: f64,
    /// The rate before the most recent change, for trend display.
    pub previous_rate: Option<f64>,
    pub buy_rate: f64,
    pub sell_rate: f64,
    pub auto_update: bool,
    pub active: bool,
    pub last_updated: DateTime<Utc>,
}

/// A rate together with both of its currencies, the shape returned by the
/// API and pushed to realtime subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    #[serde(flatten)]
    pub rate: Model,
    pub from_currency: Option<currencies::Model>,
    pub to_currency: Option<currencies::Model>,
}
