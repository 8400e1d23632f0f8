use super::{
    CurrencyStore, ExchangeRateStore, OrderQuery, OrderStore, Page, PaymentMethodStore,
    RateBuilder, UserBuilder, UserQuery, UserStore,
};
use crate::error::Error;
use crate::{currencies, exchange_rates, orders, payment_methods, users, Id};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Process-local store backed by concurrent maps. Data lives as long as the
/// process; uniqueness rules are enforced by the domain operations, except
/// for the rate pair and user email keys which are indexed here.
#[derive(Default)]
pub struct MemoryStore {
    currencies: DashMap<Id, currencies::Model>,
    rates: DashMap<Id, exchange_rates::Model>,
    /// (from, to) -> rate id
    rate_pairs: DashMap<(Id, Id), Id>,
    orders: DashMap<Id, orders::Model>,
    payment_methods: DashMap<Id, payment_methods::Model>,
    users: DashMap<Id, users::Model>,
    /// lowercased email -> user id
    user_emails: DashMap<String, Id>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CurrencyStore for MemoryStore {
    async fn list_currencies(&self) -> Result<Vec<currencies::Model>, Error> {
        Ok(self
            .currencies
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_currency(&self, id: Id) -> Result<Option<currencies::Model>, Error> {
        Ok(self.currencies.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_currency_by_code(
        &self,
        code: &str,
    ) -> Result<Option<currencies::Model>, Error> {
        Ok(self
            .currencies
            .iter()
            .find(|entry| entry.value().code.eq_ignore_ascii_case(code))
            .map(|entry| entry.value().clone()))
    }

    async fn save_currency(&self, model: currencies::Model) -> Result<currencies::Model, Error> {
        self.currencies.insert(model.id, model.clone());
        Ok(model)
    }

    async fn delete_currency(&self, id: Id) -> Result<bool, Error> {
        Ok(self.currencies.remove(&id).is_some())
    }
}

#[async_trait]
impl ExchangeRateStore for MemoryStore {
    async fn list_rates(&self) -> Result<Vec<exchange_rates::Model>, Error> {
        Ok(self.rates.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn find_rate(&self, id: Id) -> Result<Option<exchange_rates::Model>, Error> {
        Ok(self.rates.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_rate_by_pair(
        &self,
        from_currency_id: Id,
        to_currency_id: Id,
    ) -> Result<Option<exchange_rates::Model>, Error> {
        let Some(id) = self
            .rate_pairs
            .get(&(from_currency_id, to_currency_id))
            .map(|entry| *entry.value())
        else {
            return Ok(None);
        };
        self.find_rate(id).await
    }

    async fn save_rate(&self, model: exchange_rates::Model) -> Result<exchange_rates::Model, Error> {
        self.rates.insert(model.id, model.clone());
        self.rate_pairs
            .entry((model.from_currency_id, model.to_currency_id))
            .or_insert(model.id);
        Ok(model)
    }

    async fn upsert_rate_by_pair(
        &self,
        from_currency_id: Id,
        to_currency_id: Id,
        build: RateBuilder,
    ) -> Result<exchange_rates::Model, Error> {
        // The pair entry stays locked until the rate is stored.
        let pair = self.rate_pairs.entry((from_currency_id, to_currency_id));
        let existing = match &pair {
            Entry::Occupied(entry) => self.rates.get(entry.get()).map(|rate| rate.clone()),
            Entry::Vacant(_) => None,
        };

        let model = build(existing);
        self.rates.insert(model.id, model.clone());
        pair.or_insert(model.id);
        Ok(model)
    }
}

fn order_matches(order: &orders::Model, query: &OrderQuery) -> bool {
    if let Some(status) = query.status {
        if order.status != status {
            return false;
        }
    }
    if let Some(email) = &query.user_email {
        if !order.user_email.eq_ignore_ascii_case(email) {
            return false;
        }
    }
    if let Some(payment_method_id) = query.payment_method_id {
        if order.payment_method_id != payment_method_id {
            return false;
        }
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        let in_id = order.id.to_string().contains(&needle);
        let in_email = order.user_email.to_lowercase().contains(&needle);
        if !in_id && !in_email {
            return false;
        }
    }
    true
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn query_orders(&self, query: &OrderQuery) -> Result<Page<orders::Model>, Error> {
        let mut found: Vec<orders::Model> = self
            .orders
            .iter()
            .filter(|entry| order_matches(entry.value(), query))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(Page::paginate(found, query.page, query.limit))
    }

    async fn find_order(&self, id: Id) -> Result<Option<orders::Model>, Error> {
        Ok(self.orders.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save_order(&self, model: orders::Model) -> Result<orders::Model, Error> {
        self.orders.insert(model.id, model.clone());
        Ok(model)
    }
}

#[async_trait]
impl PaymentMethodStore for MemoryStore {
    async fn list_payment_methods(&self) -> Result<Vec<payment_methods::Model>, Error> {
        Ok(self
            .payment_methods
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_payment_method(
        &self,
        id: Id,
    ) -> Result<Option<payment_methods::Model>, Error> {
        Ok(self.payment_methods.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save_payment_method(
        &self,
        model: payment_methods::Model,
    ) -> Result<payment_methods::Model, Error> {
        self.payment_methods.insert(model.id, model.clone());
        Ok(model)
    }

    async fn delete_payment_method(&self, id: Id) -> Result<bool, Error> {
        Ok(self.payment_methods.remove(&id).is_some())
    }
}

fn user_matches(user: &users::Model, query: &UserQuery) -> bool {
    if let Some(status) = query.status {
        if user.status != status {
            return false;
        }
    }
    if let Some(role) = query.role {
        if user.role != role {
            return false;
        }
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        if !user.name.to_lowercase().contains(&needle)
            && !user.email.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    true
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn query_users(&self, query: &UserQuery) -> Result<Page<users::Model>, Error> {
        let mut found: Vec<users::Model> = self
            .users
            .iter()
            .filter(|entry| user_matches(entry.value(), query))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));

        Ok(Page::paginate(found, query.page, query.limit))
    }

    async fn find_user(&self, id: Id) -> Result<Option<users::Model>, Error> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<users::Model>, Error> {
        let Some(id) = self
            .user_emails
            .get(&email.to_lowercase())
            .map(|entry| *entry.value())
        else {
            return Ok(None);
        };
        self.find_user(id).await
    }

    async fn save_user(&self, model: users::Model) -> Result<users::Model, Error> {
        self.users.insert(model.id, model.clone());
        Ok(model)
    }

    async fn upsert_user_by_email(
        &self,
        email: &str,
        build: UserBuilder,
    ) -> Result<users::Model, Error> {
        let key = self.user_emails.entry(email.to_lowercase());
        let existing = match &key {
            Entry::Occupied(entry) => self.users.get(entry.get()).map(|user| user.clone()),
            Entry::Vacant(_) => None,
        };

        let model = build(existing);
        self.users.insert(model.id, model.clone());
        key.or_insert(model.id);
        Ok(model)
    }
}
