//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler, the decode-once codec for inbound frames,
//! and the outbound frame builders.

pub mod codec;
pub mod outbound;
pub mod ws;
