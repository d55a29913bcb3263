//! Lightweight in-process metrics.
//!
//! Stored as atomics, rendered by the `/metrics` handler.

pub mod metrics;

pub use metrics::GatewayMetrics;
