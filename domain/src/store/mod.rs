//! The narrow persistence interface the domain operations are written against.
//!
//! Each trait covers one entity with the handful of "persist/query" calls the
//! write paths need. A relational backend implements them with real queries;
//! [`memory::MemoryStore`] is the in-process implementation.

use crate::error::Error;
use crate::orders::OrderStatus;
use crate::users::{UserRole, UserStatus};
use crate::{currencies, exchange_rates, orders, payment_methods, users, Id};
use async_trait::async_trait;
use serde::Serialize;

pub mod memory;

pub use memory::MemoryStore;

#[async_trait]
pub trait CurrencyStore: Send + Sync {
    async fn list_currencies(&self) -> Result<Vec<currencies::Model>, Error>;
    async fn find_currency(&self, id: Id) -> Result<Option<currencies::Model>, Error>;
    async fn find_currency_by_code(&self, code: &str)
        -> Result<Option<currencies::Model>, Error>;
    /// Inserts or replaces the currency with the same id.
    async fn save_currency(&self, model: currencies::Model) -> Result<currencies::Model, Error>;
    /// Returns false if nothing was deleted.
    async fn delete_currency(&self, id: Id) -> Result<bool, Error>;
}

#[async_trait]
pub trait ExchangeRateStore: Send + Sync {
    async fn list_rates(&self) -> Result<Vec<exchange_rates::Model>, Error>;
    async fn find_rate(&self, id: Id) -> Result<Option<exchange_rates::Model>, Error>;
    async fn find_rate_by_pair(
        &self,
        from_currency_id: Id,
        to_currency_id: Id,
    ) -> Result<Option<exchange_rates::Model>, Error>;
    /// Inserts or replaces the rate with the same id.
    async fn save_rate(&self, model: exchange_rates::Model) -> Result<exchange_rates::Model, Error>;
    /// Saves the rate that `build` derives from the current rate of the pair,
    /// if any. Concurrent calls for the same pair are serialized, so a pair
    /// never ends up with two rates.
    async fn upsert_rate_by_pair(
        &self,
        from_currency_id: Id,
        to_currency_id: Id,
        build: RateBuilder,
    ) -> Result<exchange_rates::Model, Error>;
}

/// Derives the rate to save from the pair's existing rate.
pub type RateBuilder =
    Box<dyn FnOnce(Option<exchange_rates::Model>) -> exchange_rates::Model + Send>;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Newest first, filtered and paginated by `query`.
    async fn query_orders(&self, query: &OrderQuery) -> Result<Page<orders::Model>, Error>;
    async fn find_order(&self, id: Id) -> Result<Option<orders::Model>, Error>;
    /// Inserts or replaces the order with the same id.
    async fn save_order(&self, model: orders::Model) -> Result<orders::Model, Error>;
}

#[async_trait]
pub trait PaymentMethodStore: Send + Sync {
    async fn list_payment_methods(&self) -> Result<Vec<payment_methods::Model>, Error>;
    async fn find_payment_method(&self, id: Id)
        -> Result<Option<payment_methods::Model>, Error>;
    /// Inserts or replaces the payment method with the same id.
    async fn save_payment_method(
        &self,
        model: payment_methods::Model,
    ) -> Result<payment_methods::Model, Error>;
    /// Returns false if nothing was deleted.
    async fn delete_payment_method(&self, id: Id) -> Result<bool, Error>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Newest first, filtered and paginated by `query`.
    async fn query_users(&self, query: &UserQuery) -> Result<Page<users::Model>, Error>;
    async fn find_user(&self, id: Id) -> Result<Option<users::Model>, Error>;
    /// Case-insensitive.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<users::Model>, Error>;
    /// Replaces an existing user.
    async fn save_user(&self, model: users::Model) -> Result<users::Model, Error>;
    /// Saves the user that `build` derives from the current user with this
    /// email, if any. Concurrent calls for the same email are serialized.
    async fn upsert_user_by_email(
        &self,
        email: &str,
        build: UserBuilder,
    ) -> Result<users::Model, Error>;
}

/// Derives the user to save from the existing user with the same email.
pub type UserBuilder = Box<dyn FnOnce(Option<users::Model>) -> users::Model + Send>;

/// Everything the application needs from persistence, as one object.
pub trait Store:
    CurrencyStore + ExchangeRateStore + OrderStore + PaymentMethodStore + UserStore
{
}

impl<T> Store for T where
    T: CurrencyStore + ExchangeRateStore + OrderStore + PaymentMethodStore + UserStore
{
}

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Filters and pagination for listing orders.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// Case-insensitive substring of the order id or the customer's email.
    pub search: Option<String>,
    /// Exact customer email.
    pub user_email: Option<String>,
    pub payment_method_id: Option<Id>,
    /// 1-based page number.
    pub page: u64,
    /// Page size; 0 means no limit.
    pub limit: u64,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            user_email: None,
            payment_method_id: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl OrderQuery {
    pub fn offset(&self) -> usize {
        offset(self.page, self.limit)
    }
}

/// Filters and pagination for listing users.
#[derive(Debug, Clone, PartialEq)]
pub struct UserQuery {
    /// Case-insensitive substring of the name or the email.
    pub search: Option<String>,
    pub status: Option<UserStatus>,
    pub role: Option<UserRole>,
    /// 1-based page number.
    pub page: u64,
    /// Page size; 0 means no limit.
    pub limit: u64,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            role: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl UserQuery {
    pub fn offset(&self) -> usize {
        offset(self.page, self.limit)
    }
}

fn offset(page: u64, limit: u64) -> usize {
    (page.max(1) - 1).saturating_mul(limit) as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 {
            u64::from(total > 0)
        } else {
            total.div_ceil(limit)
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Slices one page out of `items`, which must already be in display order.
    pub fn paginate(items: Vec<T>, page: u64, limit: u64) -> Self {
        let total = items.len() as u64;
        let items = if limit == 0 {
            items
        } else {
            items
                .into_iter()
                .skip(offset(page, limit))
                .take(limit as usize)
                .collect()
        };
        Page {
            items,
            pagination: Pagination::new(page, limit, total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
