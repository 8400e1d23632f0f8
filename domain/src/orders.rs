use crate::{currencies, payment_methods, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    PaymentReceived,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::PendingPayment,
        OrderStatus::PaymentReceived,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Failed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::PaymentReceived => "payment_received",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| format!("Unknown order status: {value}"))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = domain::orders::Model)]
pub struct Model {
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    /// Email of the customer that placed the order.
    pub user_email: String,
    #[schema(value_type = String, format = Uuid)]
    pub from_currency_id: Id,
    pub from_amount: f64,
    #[schema(value_type = String, format = Uuid)]
    pub to_currency_id: Id,
    pub to_amount: f64,
    #[schema(value_type = String, format = Uuid)]
    pub payment_method_id: Id,
    pub recipient_name: Option<String>,
    pub recipient_bank: Option<String>,
    pub recipient_account_number: Option<String>,
    pub recipient_swift: Option<String>,
    pub recipient_wallet_address: Option<String>,
    /// Rate quoted to the customer when the order was placed.
    pub exchange_rate: f64,
    pub fee: f64,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    #[serde(flatten)]
    pub order: Model,
    pub from_currency: Option<currencies::Model>,
    pub to_currency: Option<currencies::Model>,
    pub payment_method: Option<payment_methods::Model>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_wire_name() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::Value::String(status.as_str().to_string())
            );
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
