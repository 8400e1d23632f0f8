//! Event system infrastructure for the RayEx platform.
//!
//! This crate decouples the back-office write paths from the realtime delivery
//! sinks that care about them (the SSE broadcaster, the cross-instance relay).
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing all business events in the system
//! - **EventHandler**: Trait for implementing event sinks
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (domain, sse, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.

use async_trait::async_trait;
use log::*;
use serde_json::Value;
use std::sync::Arc;

/// Domain events that represent business-level changes in the system.
/// These events are emitted after a write has been persisted.
///
/// Entity data is carried as `serde_json::Value` so that every sink sees the
/// exact shape the REST API returns for the same entity.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// An exchange rate was created or changed. Carries the rate together with
    /// its `fromCurrency`/`toCurrency` views. Everyone is notified.
    ExchangeRateUpdated { exchange_rate: Value },
    /// A currency was created, edited or had its active flag toggled.
    /// Only administrators are notified.
    CurrencyUpdated { currency: Value },
    /// A user was synced from the identity provider or had their status
    /// changed. Only administrators are notified.
    UserUpdated { user: Value },
    /// A customer placed a new order.
    OrderCreated {
        /// Email of the customer that owns the order, used to address their private room.
        user_email: String,
        order: Value,
    },
    /// An administrator moved an order to a new status.
    OrderStatusUpdated {
        /// Email of the customer that owns the order, used to address their private room.
        user_email: String,
        order: Value,
    },
}

impl DomainEvent {
    /// Short, stable label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::ExchangeRateUpdated { .. } => "exchange_rate_updated",
            DomainEvent::CurrencyUpdated { .. } => "currency_updated",
            DomainEvent::UserUpdated { .. } => "user_updated",
            DomainEvent::OrderCreated { .. } => "order_created",
            DomainEvent::OrderStatusUpdated { .. } => "order_status_updated",
        }
    }
}

/// Trait for handling domain events.
/// Implementations perform side effects like pushing realtime notifications
/// or forwarding to an external bus. Handlers must not fail the caller, so
/// there is no error channel: log and move on.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Publish an event to all registered handlers.
    pub async fn publish(&self, event: DomainEvent) {
        trace!(
            "Publishing {} to {} handler(s)",
            event.kind(),
            self.handlers.len()
        );
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
