//! Helpers for testing metric pipelines.
pub mod metrics;
