//! Metrics Export
pub mod metrics;
