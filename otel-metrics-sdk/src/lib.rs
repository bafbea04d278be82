//! Metrics SDK for the otel-metrics aggregation pipeline.
//!
//! Measurements recorded through an [`Accumulator`] are folded into
//! per-instrument, per-label-set [`Aggregator`]s. On every collection the
//! accumulator checkpoints the aggregators that saw updates and hands them to a
//! [`Batcher`], which groups records by label encoding and exposes the result
//! as a [`CheckpointSet`] for an [`Exporter`].
//!
//! ```
//! use otel_metrics::metrics::{Descriptor, InstrumentKind, NumberKind};
//! use otel_metrics::KeyValue;
//! use otel_metrics_sdk::export::metrics::{CheckpointSet, LockedBatcher, Sum};
//! use otel_metrics_sdk::metrics::{batchers::ungrouped, selectors::simple, Accumulator};
//! use std::sync::Arc;
//!
//! let batcher = Arc::new(ungrouped(Box::new(simple::inexpensive())).build());
//! let accumulator = Accumulator::new(batcher.clone());
//!
//! let requests = Arc::new(Descriptor::new("requests", InstrumentKind::Counter, NumberKind::I64));
//! accumulator.record_one(&requests, 123i64, &[KeyValue::new("A", "B")]);
//!
//! let mut locked = batcher.lock().unwrap();
//! assert_eq!(accumulator.collect(&mut locked), 1);
//!
//! let mut total = 0;
//! locked
//!     .checkpoint_set()
//!     .try_for_each(&mut |record| {
//!         let agg = record.aggregator().downcast::<i64>().unwrap();
//!         total += agg.as_sum().unwrap().sum()?;
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(total, 123);
//! locked.finished_collection();
//! ```
//!
//! ## Crate Feature Flags
//!
//! * `internal-logs`: Enables internal logging via `tracing` (default).
//! * `testing`: Enables the in-memory exporter used by integration tests.
//!
//! [`Accumulator`]: metrics::Accumulator
//! [`Aggregator`]: metrics::aggregators::Aggregator
//! [`Batcher`]: export::metrics::Batcher
//! [`CheckpointSet`]: export::metrics::CheckpointSet
//! [`Exporter`]: export::metrics::Exporter
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]

pub mod export;
pub mod metrics;
#[cfg(feature = "testing")]
#[doc(hidden)]
pub mod testing;
