//! Wire protocol for the dashboard WebSocket.
//!
//! Only the text lane exists: JSON envelopes whose `data` is kept as a
//! `RawValue` so services parse their own payloads. Parsing never panics;
//! malformed input surfaces as `SignalWatchError::BadRequest`.

pub mod text;
