//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the realtime stream.
//! The core SSE infrastructure (Manager, ConnectionRegistry, Message types)
//! lives in the `sse` crate so the domain event sink and the relay can use it
//! without depending on `web`.

pub mod handler;
