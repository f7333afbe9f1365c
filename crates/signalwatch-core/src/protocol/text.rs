//! Text envelope (JSON).
//!
//! The core stores `data` as `RawValue` to enable lazy parsing by services.

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::{Result, SignalWatchError};

/// Only protocol version currently spoken.
pub const PROTOCOL_VERSION: u8 = 1;

/// Inbound envelope (Text frame).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// Protocol version.
    pub v: u8,
    /// Service name (e.g., "traffic").
    pub svc: String,
    /// Message type (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Optional client sequence number, echoed in acks.
    #[serde(default)]
    pub seq: Option<u64>,
    /// Optional payload, stored as raw JSON (lazy parsing).
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

impl Envelope {
    /// Parse and version-check a text frame.
    pub fn parse(s: &str) -> Result<Self> {
        let env: Envelope = serde_json::from_str(s)
            .map_err(|e| SignalWatchError::BadRequest(format!("invalid envelope json: {e}")))?;
        if env.v != PROTOCOL_VERSION {
            return Err(SignalWatchError::UnsupportedVersion);
        }
        Ok(env)
    }

    /// Deserialize `data` into a service-specific request.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let raw = self.data.as_ref().ok_or_else(|| {
            SignalWatchError::BadRequest(format!("{}.{} requires data", self.svc, self.msg_type))
        })?;
        serde_json::from_str(raw.get()).map_err(|e| {
            SignalWatchError::BadRequest(format!("{}.{} invalid data: {e}", self.svc, self.msg_type))
        })
    }
}
