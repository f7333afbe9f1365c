//! Built-in text services.

pub mod traffic;

pub use traffic::TrafficService;
