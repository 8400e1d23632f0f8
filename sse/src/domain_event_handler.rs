use crate::message::{Event as SseEvent, Message as SseMessage, Room, Rooms};
use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Handles domain events by converting them to SSE messages and broadcasting
/// them to the rooms that should see them:
///
/// - exchange rates go to everyone (`public`)
/// - currency and user changes go to administrators
/// - order changes go to administrators and the owning user's private room
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }

    fn message_for(event: &DomainEvent) -> SseMessage {
        match event {
            DomainEvent::ExchangeRateUpdated { exchange_rate } => SseMessage {
                event: SseEvent::RateUpdated(exchange_rate.clone()),
                rooms: Rooms::from(Room::public()),
            },
            DomainEvent::CurrencyUpdated { currency } => SseMessage {
                event: SseEvent::CurrencyUpdated(currency.clone()),
                rooms: Rooms::from(Room::admins()),
            },
            DomainEvent::UserUpdated { user } => SseMessage {
                event: SseEvent::UserUpdated(user.clone()),
                rooms: Rooms::from(Room::admins()),
            },
            DomainEvent::OrderCreated { user_email, order } => SseMessage {
                event: SseEvent::NewOrder(order.clone()),
                rooms: Self::order_rooms(user_email),
            },
            DomainEvent::OrderStatusUpdated { user_email, order } => SseMessage {
                event: SseEvent::OrderUpdated(order.clone()),
                rooms: Self::order_rooms(user_email),
            },
        }
    }

    fn order_rooms(user_email: &str) -> Rooms {
        Rooms::from(vec![Room::admins(), Room::user(user_email)])
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        let message = Self::message_for(event);
        debug!("Handling {} event for rooms {}", event.kind(), message.rooms);
        self.sse_manager.send_message(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Frame;
    use serde_json::json;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn connect(manager: &Manager, id: &str, rooms: Rooms) -> UnboundedReceiver<Frame> {
        let (tx, rx) = unbounded_channel();
        manager.register_connection(id.into(), tx, rooms);
        rx
    }

    #[tokio::test]
    async fn order_events_reach_admins_and_owner_only() {
        let manager = Arc::new(Manager::new());
        let mut admin = connect(&manager, "admin_1", Rooms::from(Room::admins()));
        let mut owner = connect(&manager, "a@x.com", Rooms::from(Room::user("a@x.com")));
        let mut other = connect(&manager, "b@x.com", Rooms::from(Room::user("b@x.com")));
        let handler = SseDomainEventHandler::new(manager.clone());

        handler
            .handle(&DomainEvent::OrderCreated {
                user_email: "a@x.com".to_string(),
                order: json!({"id": "o1"}),
            })
            .await;

        let expected = Frame::Event {
            name: "new_order".to_string(),
            data: "{\"id\":\"o1\"}".to_string(),
        };
        assert_eq!(admin.try_recv().unwrap(), expected);
        assert_eq!(owner.try_recv().unwrap(), expected);
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn admin_owner_receives_order_update_once() {
        let manager = Arc::new(Manager::new());
        let mut both = connect(
            &manager,
            "a@x.com",
            Rooms::from(vec![Room::admins(), Room::user("a@x.com")]),
        );
        let handler = SseDomainEventHandler::new(manager.clone());

        handler
            .handle(&DomainEvent::OrderStatusUpdated {
                user_email: "a@x.com".to_string(),
                order: json!({"status": "completed"}),
            })
            .await;

        assert!(both.try_recv().is_ok());
        assert!(both.try_recv().is_err());
    }

    #[tokio::test]
    async fn rate_updates_are_public_and_currency_updates_admin_only() {
        let manager = Arc::new(Manager::new());
        let mut admin = connect(&manager, "admin_1", Rooms::from(Room::admins()));
        let mut visitor = connect(&manager, "admin_x1", Rooms::new());
        let handler = SseDomainEventHandler::new(manager.clone());

        handler
            .handle(&DomainEvent::ExchangeRateUpdated {
                exchange_rate: json!({"rate": 1.08}),
            })
            .await;
        handler
            .handle(&DomainEvent::CurrencyUpdated {
                currency: json!({"code": "EUR"}),
            })
            .await;

        assert!(visitor.try_recv().unwrap().encode().starts_with("event: rate_updated"));
        assert!(visitor.try_recv().is_err());
        assert!(admin.try_recv().unwrap().encode().starts_with("event: rate_updated"));
        assert!(admin.try_recv().unwrap().encode().starts_with("event: currency_updated"));
    }

    #[tokio::test]
    async fn user_updates_reach_admins_only() {
        let manager = Arc::new(Manager::new());
        let mut admin = connect(&manager, "admin_1", Rooms::from(Room::admins()));
        let mut subject = connect(&manager, "a@x.com", Rooms::from(Room::user("a@x.com")));
        let handler = SseDomainEventHandler::new(manager.clone());

        handler
            .handle(&DomainEvent::UserUpdated {
                user: json!({"email": "a@x.com", "status": "suspended"}),
            })
            .await;

        assert_eq!(
            admin.try_recv().unwrap(),
            Frame::Event {
                name: "user_updated".to_string(),
                data: "{\"email\":\"a@x.com\",\"status\":\"suspended\"}".to_string(),
            }
        );
        assert!(subject.try_recv().is_err());
    }
}
