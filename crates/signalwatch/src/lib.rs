//! Top-level facade crate for signalwatch.
//!
//! Re-exports the core model/generator and the gateway library so users can
//! depend on a single crate.

pub mod core {
    pub use signalwatch_core::*;
}

pub mod gateway {
    pub use signalwatch_gateway::*;
}

pub use signalwatch_core::{generate, Junction, JunctionSet, SignalState, Snapshot};
