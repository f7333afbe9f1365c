//! Decode-once codec for inbound WebSocket messages.
//!
//! - Text frames => `Envelope` (lazy `RawValue` for data)
//! - Binary frames are surfaced with their length only; the dashboard speaks text
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use signalwatch_core::{error::Result, protocol::text::Envelope};

#[derive(Debug)]
pub enum Inbound {
    Text { env: Envelope, bytes_len: usize },
    Binary { bytes_len: usize },
    Ping(Vec<u8>),
    Pong,
    Close,
}

/// Frame size before any parsing.
pub fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) | Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let bytes_len = s.len();
            let env = Envelope::parse(&s)?;
            Ok(Inbound::Text { env, bytes_len })
        }
        Message::Binary(b) => Ok(Inbound::Binary { bytes_len: b.len() }),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(_) => Ok(Inbound::Pong),
        Message::Close(_) => Ok(Inbound::Close),
    }
}
