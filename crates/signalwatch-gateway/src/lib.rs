//! signalwatch gateway library entry.
//!
//! Wires the refresh controller, the HTTP API, the WebSocket display surface,
//! and the built-in services into one axum application. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod obs;
pub mod ops;
pub mod router;
pub mod services;
pub mod session;
pub mod transport;
