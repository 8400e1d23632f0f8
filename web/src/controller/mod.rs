use domain::store::Pagination;
use serde::Serialize;

pub(crate) mod currency_controller;
pub(crate) mod exchange_rate_controller;
pub(crate) mod health_check_controller;
pub(crate) mod order_controller;
pub(crate) mod payment_method_controller;
pub(crate) mod user_controller;

/// Envelope every JSON endpoint answers with.
#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            pagination: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn message_only(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: true,
            message: Some(message.into()),
            data: None,
            pagination: None,
        }
    }
}
