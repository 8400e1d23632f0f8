//! Cross-instance relay of exchange-rate updates over Redis pub/sub.
//!
//! Every server instance keeps its own SSE registry, so a rate changed on one
//! instance must reach the clients connected to the others. The relay has two
//! halves:
//!
//! - [`publisher::RelayPublisher`] is an [`events::EventHandler`] that writes
//!   each `ExchangeRateUpdated` payload to the [`RATE_UPDATED_CHANNEL`].
//! - [`subscriber::RelaySubscriber`] listens on that channel and hands each
//!   message to an [`sse::Broadcaster`] for the `public` room.
//!
//! Outgoing payloads carry an [`ORIGIN_FIELD`] member naming the instance that
//! sent them. The subscriber drops its own messages, since the local SSE
//! handler already delivered them, and strips the member from everything else
//! so clients see the plain rate.
//!
//! On the bus a message is therefore the rate JSON plus that one member.
//! Untagged messages from publishers that predate it are still delivered.

use serde_json::Value;

pub mod error;
pub mod publisher;
pub mod subscriber;

pub use error::Error;
pub use publisher::RelayPublisher;
pub use subscriber::RelaySubscriber;

pub const RATE_UPDATED_CHANNEL: &str = "RATE_UPDATED";
pub const ORIGIN_FIELD: &str = "_origin";

/// Marks an outgoing payload with the sending instance. Non-object payloads
/// are sent as they are.
pub fn tag_origin(mut payload: Value, instance_id: &str) -> Value {
    if let Value::Object(map) = &mut payload {
        map.insert(
            ORIGIN_FIELD.to_string(),
            Value::String(instance_id.to_string()),
        );
    }
    payload
}

/// Returns the payload to deliver locally, or `None` when it was sent by
/// `instance_id` itself.
pub fn accept_remote(mut payload: Value, instance_id: &str) -> Option<Value> {
    if let Value::Object(map) = &mut payload {
        if let Some(origin) = map.remove(ORIGIN_FIELD) {
            if origin.as_str() == Some(instance_id) {
                return None;
            }
        }
    }
    Some(payload)
}
