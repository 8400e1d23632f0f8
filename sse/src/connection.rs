use crate::message::{Frame, Rooms};
use dashmap::DashMap;
use log::*;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::UnboundedSender;

/// Sending half of a connection's event stream. The HTTP response owns the
/// receiving half; when it is dropped the transport is closed.
pub type Transport = UnboundedSender<Frame>;

/// Caller-visible connection identifier. Not unique: two browser tabs of the
/// same user share one id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `<prefix>_` followed by 9 random lowercase alphanumerics, for callers
    /// that did not identify themselves.
    pub fn generated(prefix: &str) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(|c| char::from(c).to_ascii_lowercase())
            .collect();
        Self(format!("{prefix}_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Internal handle of exactly one registry entry (server-generated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey(u64);

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One open event-stream. Rooms are fixed at registration.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub rooms: Rooms,
    transport: Transport,
}

impl Connection {
    pub fn send(&self, frame: Frame) -> Result<(), SendError<Frame>> {
        self.transport.send(frame)
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }
}

/// What the caller gets back from `register`.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub key: ConnectionKey,
    pub id: ConnectionId,
    pub rooms: Rooms,
}

/// Live set of event-stream connections.
///
/// A single `DashMap` backs registration, removal and every broadcast scan,
/// so there is no secondary index to keep in sync. Broadcasting is a linear
/// scan over all connections; fine for tens to low thousands of streams. A
/// room -> keys index would make it proportional to the room size instead.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionKey, Connection>,
    next_key: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_key: AtomicU64::new(1),
        }
    }

    /// Adds a connection. `public` is always prepended to `rooms`.
    pub fn register(&self, id: ConnectionId, transport: Transport, rooms: Rooms) -> Registration {
        let key = ConnectionKey(self.next_key.fetch_add(1, Ordering::Relaxed));
        let rooms = Rooms::with_public(rooms);

        self.connections.insert(
            key,
            Connection {
                id: id.clone(),
                rooms: rooms.clone(),
                transport,
            },
        );

        Registration { key, id, rooms }
    }

    /// Removes every connection registered under `id`. Unknown ids are a no-op.
    /// Returns how many entries were dropped.
    pub fn unregister(&self, id: &ConnectionId) -> usize {
        let before = self.connections.len();
        self.connections.retain(|_, connection| connection.id != *id);
        before.saturating_sub(self.connections.len())
    }

    /// Removes exactly the entry behind `key`. Returns false if it was already gone.
    pub fn unregister_connection(&self, key: ConnectionKey) -> bool {
        self.connections.remove(&key).is_some()
    }

    /// Drops every entry, closing each transport so its stream ends.
    /// Returns how many entries were dropped.
    pub fn clear(&self) -> usize {
        let before = self.connections.len();
        self.connections.clear();
        before
    }

    /// Writes `frame` to every connection whose rooms intersect `rooms`.
    /// A connection in several targeted rooms gets the frame once. Failed
    /// writes are logged and skipped; the close path removes dead entries.
    pub fn send_to_rooms(&self, rooms: &Rooms, frame: &Frame) -> usize {
        let mut delivered = 0;
        for entry in self.connections.iter() {
            let connection = entry.value();
            if !connection.rooms.intersects(rooms) {
                continue;
            }
            match connection.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    "Failed to send event to connection {} ({}): {}. Connection will be cleaned up.",
                    connection.id,
                    entry.key(),
                    e
                ),
            }
        }
        delivered
    }

    /// Writes `frame` to a single connection.
    pub fn send_to_connection(&self, key: ConnectionKey, frame: Frame) -> bool {
        match self.connections.get(&key) {
            Some(connection) => match connection.send(frame) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to send to connection {} ({key}): {e}", connection.id);
                    false
                }
            },
            None => false,
        }
    }

    /// Writes `frame` to every connection regardless of rooms.
    pub fn send_to_all(&self, frame: &Frame) -> usize {
        let mut delivered = 0;
        for entry in self.connections.iter() {
            match entry.value().send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => trace!(
                    "Skipping closed connection {} ({})",
                    entry.value().id,
                    entry.key()
                ),
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.iter().any(|entry| entry.value().id == *id)
    }

    /// Room sets of every connection registered under `id`.
    pub fn rooms_of(&self, id: &ConnectionId) -> Vec<Rooms> {
        self.connections
            .iter()
            .filter(|entry| entry.value().id == *id)
            .map(|entry| entry.value().rooms.clone())
            .collect()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
