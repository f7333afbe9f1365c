//! In-process observability.
//!
//! Counters, gauges, and a latency histogram kept as atomics and rendered in
//! Prometheus text format by the `/metrics` handler.

pub mod metrics;

pub use metrics::DashboardMetrics;
