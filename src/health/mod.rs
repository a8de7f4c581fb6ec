//! Readiness gating against the liveness endpoint.

pub mod gate;

pub use gate::{block_until_ready, ReadinessError};
