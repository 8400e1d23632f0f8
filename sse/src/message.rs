use axum::response::sse::Event as AxumEvent;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Room every connection joins implicitly.
pub const PUBLIC_ROOM: &str = "public";
/// Room for administrative dashboards.
pub const ADMINS_ROOM: &str = "admins";
/// Prefix of a single end user's private room.
pub const USER_ROOM_PREFIX: &str = "user_";

/// A broadcast-group label. Rooms are not stored anywhere; they only exist as
/// keys that connections carry and publishes target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Room(String);

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn public() -> Self {
        Self(PUBLIC_ROOM.to_string())
    }

    pub fn admins() -> Self {
        Self(ADMINS_ROOM.to_string())
    }

    /// The private room of the user identified by `identity` (their email).
    pub fn user(identity: &str) -> Self {
        Self(format!("{USER_ROOM_PREFIX}{identity}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_public(&self) -> bool {
        self.0 == PUBLIC_ROOM
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Room {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Room {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&Room> for Room {
    fn from(room: &Room) -> Self {
        room.clone()
    }
}

/// An ordered set of rooms. Insertion order is kept for readable logs,
/// duplicates are dropped on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rooms(Vec<Room>);

impl Rooms {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds the membership set of a new connection: `public` first, then
    /// `rooms` in the given order.
    pub fn with_public(rooms: Rooms) -> Self {
        let mut all = Rooms::new().with(Room::public());
        for room in rooms.0 {
            all.insert(room);
        }
        all
    }

    pub fn with(mut self, room: impl Into<Room>) -> Self {
        self.insert(room.into());
        self
    }

    pub fn insert(&mut self, room: Room) {
        if !self.0.contains(&room) {
            self.0.push(room);
        }
    }

    pub fn contains(&self, room: &Room) -> bool {
        self.0.contains(room)
    }

    /// True when at least one room is shared. Connections hold a handful of
    /// rooms, so the quadratic scan beats hashing here.
    pub fn intersects(&self, other: &Rooms) -> bool {
        self.0.iter().any(|room| other.contains(room))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Rooms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Room::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

impl From<Room> for Rooms {
    fn from(room: Room) -> Self {
        Rooms::new().with(room)
    }
}

impl From<&str> for Rooms {
    fn from(name: &str) -> Self {
        Rooms::new().with(name)
    }
}

impl From<String> for Rooms {
    fn from(name: String) -> Self {
        Rooms::new().with(name)
    }
}

impl<T: Into<Room>> From<Vec<T>> for Rooms {
    fn from(rooms: Vec<T>) -> Self {
        rooms.into_iter().collect()
    }
}

impl<T: Into<Room> + Clone> From<&[T]> for Rooms {
    fn from(rooms: &[T]) -> Self {
        rooms.iter().cloned().collect()
    }
}

impl<T: Into<Room>, const N: usize> From<[T; N]> for Rooms {
    fn from(rooms: [T; N]) -> Self {
        rooms.into_iter().collect()
    }
}

impl<T: Into<Room>> FromIterator<T> for Rooms {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut rooms = Rooms::new();
        for room in iter {
            rooms.insert(room.into());
        }
        rooms
    }
}

/// Errors raised while turning an event into a wire frame.
#[derive(Debug)]
pub enum FrameError {
    Serialize(serde_json::Error),
    /// Event names are written on a single `event:` line.
    InvalidEventName(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Serialize(e) => write!(f, "failed to serialize SSE payload: {e}"),
            FrameError::InvalidEventName(name) => write!(f, "invalid SSE event name: {name:?}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Serialize(e) => Some(e),
            FrameError::InvalidEventName(_) => None,
        }
    }
}

/// One discrete message on an event-stream transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `event: <name>\ndata: <json>\n\n`
    Event { name: String, data: String },
    /// `: <text>\n\n`, ignored by clients.
    Comment(String),
}

impl Frame {
    pub fn event<P>(name: &str, payload: &P) -> Result<Self, FrameError>
    where
        P: Serialize + ?Sized,
    {
        if name.is_empty() || name.contains(['\n', '\r']) {
            return Err(FrameError::InvalidEventName(name.to_string()));
        }
        let data = serde_json::to_string(payload).map_err(FrameError::Serialize)?;
        Ok(Frame::Event {
            name: name.to_string(),
            data,
        })
    }

    pub fn heartbeat() -> Self {
        Frame::Comment("heartbeat".to_string())
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Frame::Event { .. })
    }

    /// Wire representation, byte for byte what the client reads.
    pub fn encode(&self) -> String {
        match self {
            Frame::Event { name, data } => format!("event: {name}\ndata: {data}\n\n"),
            Frame::Comment(text) => format!(": {text}\n\n"),
        }
    }

    pub fn into_sse_event(self) -> AxumEvent {
        match self {
            Frame::Event { name, data } => AxumEvent::default().event(name).data(data),
            Frame::Comment(text) => AxumEvent::default().comment(text),
        }
    }
}

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Payload of the acknowledgment written to every freshly accepted stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectedAck {
    pub status: String,
    pub id: String,
}

impl ConnectedAck {
    pub fn ok(id: &str) -> Self {
        Self {
            status: "ok".to_string(),
            id: id.to_string(),
        }
    }
}

/// The catalogue of typed events the platform pushes. Each variant serializes
/// as its bare payload so clients receive the entity itself in `data:`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Event {
    Connected(ConnectedAck),
    RateUpdated(Value),
    CurrencyUpdated(Value),
    UserUpdated(Value),
    NewOrder(Value),
    OrderUpdated(Value),
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::Connected(_) => "connected",
            Event::RateUpdated(_) => "rate_updated",
            Event::CurrencyUpdated(_) => "currency_updated",
            Event::UserUpdated(_) => "user_updated",
            Event::NewOrder(_) => "new_order",
            Event::OrderUpdated(_) => "order_updated",
        }
    }
}

impl Event {
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        Frame::event(self.event_type(), self)
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub event: Event,
    pub rooms: Rooms,
}
