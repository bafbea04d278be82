//! Metrics Export
use crate::metrics::aggregators::AnyAggregator;
use otel_metrics::labels::LabelSet;
use otel_metrics::metrics::{Descriptor, Result};
use std::fmt;
use std::sync::Arc;

pub mod aggregation;

pub use aggregation::{
    Aggregation, AggregationKind, Count, Distribution, LastValue, Max, Min, MinMaxSumCount,
    Points, Quantile, Sum,
};

/// Batcher is responsible for deciding which kind of aggregation to use (via
/// `aggregator_selector`), gathering exported results from the SDK during
/// collection, and deciding over which dimensions to group the exported data.
///
/// The SDK supports binding only one of these interfaces, as it has the sole
/// responsibility of determining which Aggregator to use for each record.
///
/// The selector is called concurrently in instrumentation context, while the
/// collection phase goes through a [`LockedBatcher`] obtained from the
/// concrete batcher's `lock` method.
pub trait Batcher: fmt::Debug {
    /// AggregatorSelector is responsible for selecting the concrete type of
    /// Aggregator used for a metric in the SDK.
    ///
    /// The same type should be returned for a given Descriptor, because
    /// Aggregators only know how to merge with their own type. If the result
    /// is `None`, the metric instrument will be disabled.
    fn aggregator_selector(&self) -> &dyn AggregatorSelector;
}

/// A locked batcher.
///
/// The `process` method is called during collection in a single-threaded
/// context from the SDK, after the aggregator is checkpointed, allowing the
/// batcher to build the set of metrics currently being exported.
pub trait LockedBatcher {
    /// Process is called by the SDK once per internal record, passing the
    /// export Record (a Descriptor, the corresponding Labels, and the
    /// checkpointed Aggregator).
    fn process(&mut self, record: Record) -> Result<()>;

    /// Allows a controller to access a complete checkpoint of aggregated
    /// metrics from the Batcher. This is passed to the Exporter which may then
    /// iterate over the collection of aggregated metrics.
    fn checkpoint_set(&mut self) -> &mut dyn CheckpointSet;

    /// Cleanup logic or other behavior that needs to be run by the batcher
    /// after collection is complete.
    fn finished_collection(&mut self);
}

/// AggregatorSelector supports selecting the kind of `Aggregator` to use at
/// runtime for a specific metric instrument.
pub trait AggregatorSelector: fmt::Debug {
    /// This allocates a new aggregator of a kind suitable for the requested
    /// export.
    ///
    /// When the call returns `None`, the metric instrument is explicitly
    /// disabled.
    ///
    /// This must return a consistent type to avoid confusion in later stages
    /// of the metrics export process, e.g., when merging or checkpointing
    /// aggregators for a specific instrument.
    ///
    /// This call should not block.
    fn aggregator_for(&self, descriptor: &Descriptor) -> Option<AnyAggregator>;
}

/// Exporter handles presentation of the checkpoint of aggregate metrics. This
/// is the final stage of a metrics export pipeline, where metric data are
/// formatted for a specific system.
pub trait Exporter: fmt::Debug {
    /// Export is called immediately after completing a collection pass in the
    /// SDK.
    ///
    /// The CheckpointSet interface refers to the Batcher that just completed
    /// collection.
    fn export(&self, checkpoint_set: &mut dyn CheckpointSet) -> Result<()>;
}

/// CheckpointSet allows a controller to access a complete checkpoint of
/// aggregated metrics from the Batcher. This is passed to the `Exporter`
/// which may then use `try_for_each` to iterate over the collection of
/// aggregated metrics.
pub trait CheckpointSet: fmt::Debug {
    /// This iterates over aggregated checkpoints for all metrics that were
    /// updated during the last collection period. Records whose aggregator
    /// holds no checkpointed data are skipped.
    ///
    /// Each call to the function parameter may return an error.
    /// `NoDataCollected` is tolerated silently, any other kind of error will
    /// immediately halt iteration and return the error to the caller.
    ///
    /// Iteration order is unspecified.
    fn try_for_each(&mut self, f: &mut dyn FnMut(&Record) -> Result<()>) -> Result<()>;
}

/// Record contains the exported data for a single metric instrument and label
/// set.
#[derive(Clone, Debug)]
pub struct Record {
    descriptor: Arc<Descriptor>,
    labels: LabelSet,
    aggregator: Arc<AnyAggregator>,
}

impl Record {
    /// Create a new `Record` instance.
    pub fn new(
        descriptor: Arc<Descriptor>,
        labels: LabelSet,
        aggregator: Arc<AnyAggregator>,
    ) -> Self {
        Record {
            descriptor,
            labels,
            aggregator,
        }
    }

    /// The descriptor for this metric.
    pub fn descriptor(&self) -> &Arc<Descriptor> {
        &self.descriptor
    }

    /// The labels for this metric.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// The aggregator for this metric.
    pub fn aggregator(&self) -> &Arc<AnyAggregator> {
        &self.aggregator
    }
}
