//! This module holds typed parameters for various endpoint inputs.
//!
//! Query strings are deserialized into these structs and then converted into
//! the domain's own query types, so that each endpoint validates its input by
//! type before any domain logic runs.

pub(crate) mod order;
pub(crate) mod sse;
pub(crate) mod user;
