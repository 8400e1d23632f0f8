//! Entities and write paths of the exchange platform.
//!
//! `currencies`, `exchange_rates`, `orders`, `payment_methods` and `users` hold
//! the entity models. The singular modules (`currency`, `exchange_rate`,
//! `order`, `payment_method`, `user`) hold the operations
//! on them, written against the traits in [`store`] and announcing changes
//! through an [`events::EventPublisher`].

pub type Id = uuid::Uuid;

pub mod currencies;
pub mod currency;
pub mod error;
pub mod exchange_rate;
pub mod exchange_rates;
pub mod order;
pub mod orders;
pub mod payment_method;
pub mod payment_methods;
pub mod store;
pub mod user;
pub mod users;

#[cfg(test)]
mod test_support;
