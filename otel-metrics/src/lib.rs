//! Metrics API for the otel-metrics aggregation pipeline.
//!
//! This crate holds the types shared between instrumentation and the SDK:
//! label sets and their encoders, instrument [`Descriptor`]s, the [`Number`]
//! primitives measurements are recorded with, and the [`MetricsError`] type.
//! Aggregation, batching and export live in `otel-metrics-sdk`.
//!
//! ```
//! use otel_metrics::labels::{default_encoder, LabelSet};
//! use otel_metrics::metrics::{Descriptor, InstrumentKind, NumberKind};
//! use otel_metrics::KeyValue;
//!
//! let descriptor = Descriptor::new("requests", InstrumentKind::Counter, NumberKind::I64)
//!     .with_keys(["A"]);
//! let labels = LabelSet::from(&[KeyValue::new("C", "D"), KeyValue::new("A", "B")]);
//!
//! let encoder = default_encoder();
//! assert_eq!(labels.encoded(Some(&*encoder)), "A=B,C=D");
//! assert_eq!(labels.project(descriptor.keys()).encoded(Some(&*encoder)), "A=B");
//! ```
//!
//! ## Crate Feature Flags
//!
//! * `internal-logs`: Enables internal logging via `tracing` (default).
//!
//! [`Descriptor`]: metrics::Descriptor
//! [`Number`]: metrics::Number
//! [`MetricsError`]: metrics::MetricsError
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]

mod common;

pub use common::{Key, KeyValue, StringValue, Value};

pub mod labels;

pub mod metrics;

pub mod internal_logging;

#[doc(hidden)]
#[cfg(feature = "internal-logs")]
pub mod _private {
    pub use tracing::{debug, error, info, warn};
}
