use domain::error::Error as DomainError;
use domain::orders::OrderStatus;
use domain::store::{OrderQuery, DEFAULT_LIMIT, DEFAULT_PAGE};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct IndexParams {
    /// 1-based page number, defaults to 1
    pub(crate) page: Option<u64>,
    /// Page size, defaults to 10
    pub(crate) limit: Option<u64>,
    /// Case-insensitive match against the order id or customer email
    pub(crate) search: Option<String>,
    /// One of the order statuses; empty means any
    pub(crate) status: Option<String>,
}

impl TryFrom<IndexParams> for OrderQuery {
    type Error = DomainError;

    fn try_from(params: IndexParams) -> Result<Self, Self::Error> {
        let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
            Some(status) => Some(
                status
                    .parse::<OrderStatus>()
                    .map_err(|_| DomainError::invalid("Invalid status"))?,
            ),
            None => None,
        };

        Ok(OrderQuery {
            status,
            search: params.search.filter(|s| !s.is_empty()),
            user_email: None,
            payment_method_id: None,
            page: params.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
            limit: params.limit.unwrap_or(DEFAULT_LIMIT),
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct ByUserParams {
    /// Email of the customer whose orders are listed
    pub(crate) email: Option<String>,
}
