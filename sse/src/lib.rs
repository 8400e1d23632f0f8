//! Server-Sent Events (SSE) infrastructure for real-time updates.
//!
//! This crate provides the room-based broadcaster that pushes back-office
//! changes (exchange rates, currencies, orders) to admin dashboards and
//! per-user sessions over long-lived event streams.
//!
//! # Architecture
//!
//! - **Rooms**: every connection carries a fixed set of room labels chosen at
//!   connect time. `public` is implicit, `admins` is for administrative
//!   dashboards and `user_<email>` is a single user's private channel.
//! - **Single backing collection**: one `DashMap` holds the live connections
//!   and is scanned on every broadcast. Delivery is a set-union filter: a
//!   connection in two targeted rooms receives the event once.
//! - **Fire-and-forget**: events are never retained or replayed; a write that
//!   fails on one connection is logged and skipped without affecting others.
//! - **Heartbeat**: a background task writes a `: heartbeat` comment to every
//!   connection on a fixed period so proxies keep idle streams open.
//!
//! # Message Flow
//!
//! 1. Client opens `GET /api/realtime/sse?email=...&role=...`
//! 2. The web layer derives rooms, registers the transport and writes a
//!    `connected` acknowledgment
//! 3. A write path (e.g. rate upsert) publishes a `DomainEvent`
//! 4. `SseDomainEventHandler` maps it to an `Event` plus target rooms and
//!    calls `Manager::send_message`
//! 5. When the client goes away its stream is dropped and the connection is
//!    unregistered
//!
//! # Example: Sending an event
//!
//! ```rust,ignore
//! use sse::message::Room;
//!
//! app_state.sse_manager.publish(
//!     vec![Room::admins(), Room::user(&order.user_email)],
//!     "order_updated",
//!     &order,
//! );
//! ```
//!
//! # Security Considerations
//!
//! Room membership is derived from the `email` and `role` query parameters
//! as given. Whoever fronts this service must have verified that the caller
//! may claim `role=admin` and that `email` is theirs.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry, ConnectionId and the transport type
//! - `manager`: publish/heartbeat routing over the registry, `Broadcaster` trait
//! - `message`: rooms, wire frames and the typed event catalogue
//! - `heartbeat`: the periodic liveness keeper task
//! - `domain_event_handler`: maps domain events to rooms

pub mod connection;
pub mod domain_event_handler;
pub mod heartbeat;
pub mod manager;
pub mod message;

pub use manager::{Broadcaster, Manager};
