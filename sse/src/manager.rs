use crate::connection::{ConnectionId, ConnectionKey, ConnectionRegistry, Registration, Transport};
use crate::message::{Event, EventType, Frame, Message, Rooms};
use log::*;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// The capability write paths depend on to reach realtime subscribers.
/// Implemented by [`Manager`]; relays and tests can supply their own.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, rooms: Rooms, event_name: &str, payload: &Value);
}

/// Owns the connection registry and routes events to rooms.
/// Constructed once at startup and shared behind an `Arc`.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register a new connection. `public` membership is added automatically.
    pub fn register_connection(
        &self,
        id: ConnectionId,
        transport: Transport,
        rooms: Rooms,
    ) -> Registration {
        let registration = self.registry.register(id, transport, rooms);
        info!(
            "SSE client connected: {} (rooms: {})",
            registration.id, registration.rooms
        );
        registration
    }

    /// Drop a single connection; used when its transport closes.
    pub fn unregister_connection(&self, key: ConnectionKey) {
        if self.registry.unregister_connection(key) {
            info!("SSE connection {key} closed and unregistered");
        }
    }

    /// Drop every connection registered under `id`. Unknown ids are ignored.
    pub fn unregister(&self, id: &ConnectionId) {
        let removed = self.registry.unregister(id);
        info!("SSE client disconnected: {id} ({removed} connection(s) removed)");
    }

    /// Send a typed event to exactly one connection.
    pub fn send_to_connection(&self, key: ConnectionKey, event: &Event) -> bool {
        match event.to_frame() {
            Ok(frame) => self.registry.send_to_connection(key, frame),
            Err(e) => {
                error!("Failed to build SSE frame for {}: {e}", event.event_type());
                false
            }
        }
    }

    /// Publish `payload` as `event_name` to every connection in any of `rooms`.
    ///
    /// Best-effort: nothing is returned to the caller and per-connection
    /// failures never stop delivery to the others.
    pub fn publish<R, P>(&self, rooms: R, event_name: &str, payload: &P)
    where
        R: Into<Rooms>,
        P: Serialize + ?Sized,
    {
        let rooms = rooms.into();
        let frame = match Frame::event(event_name, payload) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Dropping SSE broadcast [{event_name}]: {e}");
                return;
            }
        };

        let delivered = self.registry.send_to_rooms(&rooms, &frame);
        debug!("SSE broadcast: [{event_name}] to rooms {rooms} ({delivered} delivered)");
    }

    /// Send a typed message to its rooms.
    pub fn send_message(&self, message: Message) {
        let event_type = message.event.event_type();
        self.publish(message.rooms, event_type, &message.event);
    }

    /// Write a heartbeat comment to every open connection.
    pub fn heartbeat(&self) -> usize {
        let delivered = self.registry.send_to_all(&Frame::heartbeat());
        trace!("SSE heartbeat sent to {delivered} connection(s)");
        delivered
    }

    /// Closes every open stream. Used on shutdown so that long-lived
    /// responses end and the server can drain.
    pub fn close_all(&self) -> usize {
        let closed = self.registry.clear();
        info!("Closed {closed} SSE connection(s)");
        closed
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_registered(&self, id: &ConnectionId) -> bool {
        self.registry.contains(id)
    }

    pub fn rooms_of(&self, id: &ConnectionId) -> Vec<Rooms> {
        self.registry.rooms_of(id)
    }
}

impl Broadcaster for Manager {
    fn broadcast(&self, rooms: Rooms, event_name: &str, payload: &Value) {
        self.publish(rooms, event_name, payload);
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Room;
    use serde_json::json;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn connect(manager: &Manager, id: &str, rooms: Rooms) -> (Registration, UnboundedReceiver<Frame>) {
        let (tx, rx) = unbounded_channel();
        (manager.register_connection(id.into(), tx, rooms), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Frame>) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn publish_accepts_single_room_or_list() {
        let manager = Manager::new();
        let (_, mut admin) = connect(&manager, "admin_1", Rooms::from(Room::admins()));
        let (_, mut user) = connect(&manager, "a@x.com", Rooms::from(Room::user("a@x.com")));

        manager.publish("admins", "currency_updated", &json!({"code": "EUR"}));
        manager.publish(vec!["admins", "user_a@x.com"], "new_order", &json!({"id": 1}));

        assert_eq!(drain(&mut admin).len(), 2);
        let user_frames = drain(&mut user);
        assert_eq!(user_frames.len(), 1);
        assert_eq!(
            user_frames[0].encode(),
            "event: new_order\ndata: {\"id\":1}\n\n"
        );
    }

    #[test]
    fn public_publish_reaches_every_connection() {
        let manager = Manager::new();
        let (_, mut admin) = connect(&manager, "admin_1", Rooms::from(Room::admins()));
        let (_, mut user) = connect(&manager, "a@x.com", Rooms::from(Room::user("a@x.com")));
        let (_, mut anon) = connect(&manager, "anon", Rooms::new());

        manager.publish(Room::public(), "rate_updated", &json!({"rate": 1.1}));

        for rx in [&mut admin, &mut user, &mut anon] {
            assert_eq!(drain(rx).len(), 1);
        }
    }

    #[test]
    fn events_arrive_in_publish_order_per_connection() {
        let manager = Manager::new();
        let (_, mut rx) = connect(&manager, "a", Rooms::new());

        for n in 0..5 {
            manager.publish("public", "tick", &n);
        }

        let data: Vec<String> = drain(&mut rx)
            .into_iter()
            .map(|frame| match frame {
                Frame::Event { data, .. } => data,
                Frame::Comment(_) => unreachable!(),
            })
            .collect();
        assert_eq!(data, vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn send_message_uses_typed_event_name() {
        let manager = Manager::new();
        let (_, mut user) = connect(&manager, "a@x.com", Rooms::from(Room::user("a@x.com")));

        let message = Message {
            event: Event::OrderUpdated(json!({"status": "completed"})),
            rooms: Rooms::from(vec![Room::admins(), Room::user("a@x.com")]),
        };
        manager.send_message(message);

        let frames = drain(&mut user);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].encode().starts_with("event: order_updated\n"));
    }

    #[test]
    fn broken_connection_does_not_stop_publish() {
        let manager = Manager::new();
        let (_, broken) = connect(&manager, "broken", Rooms::from(Room::admins()));
        let (_, mut healthy) = connect(&manager, "healthy", Rooms::from(Room::admins()));
        drop(broken);

        manager.publish("admins", "currency_updated", &json!({}));

        assert_eq!(drain(&mut healthy).len(), 1);
    }

    #[test]
    fn heartbeat_sends_only_comments() {
        let manager = Manager::new();
        let (_, mut rx) = connect(&manager, "a", Rooms::new());

        assert_eq!(manager.heartbeat(), 1);
        let frames = drain(&mut rx);
        assert_eq!(frames, vec![Frame::heartbeat()]);
        assert!(frames.iter().all(|frame| !frame.is_event()));
    }

    #[test]
    fn unregister_twice_is_harmless() {
        let manager = Manager::new();
        let (_, _a) = connect(&manager, "a", Rooms::new());
        let (_, mut b) = connect(&manager, "b", Rooms::new());

        manager.unregister(&"a".into());
        manager.unregister(&"a".into());
        manager.unregister(&"ghost".into());

        assert!(!manager.is_registered(&"a".into()));
        manager.publish("public", "rate_updated", &json!({}));
        assert_eq!(drain(&mut b).len(), 1);
    }

    #[test]
    fn close_all_ends_streams_and_empties_the_registry() {
        let manager = Manager::new();
        let (_, mut a) = connect(&manager, "a", Rooms::new());
        let (_, mut b) = connect(&manager, "a", Rooms::from(Room::admins()));

        assert_eq!(manager.close_all(), 2);

        assert_eq!(manager.connection_count(), 0);
        assert!(matches!(a.try_recv(), Err(TryRecvError::Disconnected)));
        assert!(matches!(b.try_recv(), Err(TryRecvError::Disconnected)));
        assert_eq!(manager.close_all(), 0);
    }

    #[test]
    fn broadcaster_trait_delegates_to_publish() {
        let manager = Manager::new();
        let (_, mut rx) = connect(&manager, "a", Rooms::new());
        let broadcaster: &dyn Broadcaster = &manager;

        broadcaster.broadcast(Rooms::from("public"), "rate_updated", &json!({"rate": 2}));

        assert_eq!(
            drain(&mut rx),
            vec![Frame::Event {
                name: "rate_updated".to_string(),
                data: "{\"rate\":2}".to_string(),
            }]
        );
    }
}
