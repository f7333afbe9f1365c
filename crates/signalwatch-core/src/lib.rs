//! signalwatch core: junction model and road network, the synthetic metrics
//! generator, signal timing plans, the dashboard wire envelope, and the shared error type.
//!
//! This crate carries no transport or runtime dependencies so the generator
//! can be driven from the gateway, from tests, or from any other host.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! The only fallible path is configuration (an empty or malformed junction
//! list), which surfaces as `SignalWatchError::Config` at startup.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod generator;
pub mod model;
pub mod network;
pub mod plan;
pub mod protocol;

/// Shared result type.
pub use error::{Result, SignalWatchError};
pub use generator::{generate, Clock, FixedClock, LocalClock, TimeOfDay};
pub use model::{Junction, JunctionReading, JunctionSet, SignalState, Snapshot};
pub use network::{Road, RoadKind, RoadNetwork};
pub use plan::{plan_signals, signal_report, NetworkMetrics, SignalPlan, SignalReport};
