use domain::error::Error as DomainError;
use domain::store::{UserQuery, DEFAULT_LIMIT, DEFAULT_PAGE};
use domain::users::{UserRole, UserStatus};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct IndexParams {
    /// 1-based page number, defaults to 1
    pub(crate) page: Option<u64>,
    /// Page size, defaults to 10
    pub(crate) limit: Option<u64>,
    /// Case-insensitive match against the name or email
    pub(crate) search: Option<String>,
    /// `active`, `suspended` or `pending`; empty means any
    pub(crate) status: Option<String>,
    /// `user` or `admin`; empty means any
    pub(crate) role: Option<String>,
}

impl TryFrom<IndexParams> for UserQuery {
    type Error = DomainError;

    fn try_from(params: IndexParams) -> Result<Self, Self::Error> {
        let status = params
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<UserStatus>())
            .transpose()
            .map_err(DomainError::invalid)?;
        let role = params
            .role
            .as_deref()
            .filter(|r| !r.is_empty())
            .map(|r| r.parse::<UserRole>())
            .transpose()
            .map_err(DomainError::invalid)?;

        Ok(UserQuery {
            search: params.search.filter(|s| !s.is_empty()),
            status,
            role,
            page: params.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
            limit: params.limit.unwrap_or(DEFAULT_LIMIT),
        })
    }
}
