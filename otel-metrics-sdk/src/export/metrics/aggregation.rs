//! Metrics aggregation
use otel_metrics::metrics::Result;
use std::time::SystemTime;

/// An interface implemented by every [`Aggregator`], naming the kind of data
/// its checkpoint holds.
///
/// The remaining traits in this module expose the checkpointed values. Each
/// returns [`MetricsError::NoDataCollected`] while the checkpoint is empty,
/// which tells "never measured" apart from "measured as zero".
///
/// [`Aggregator`]: crate::metrics::aggregators::Aggregator
/// [`MetricsError::NoDataCollected`]: otel_metrics::metrics::MetricsError::NoDataCollected
pub trait Aggregation {
    /// A short identifying string to identify the [`Aggregator`] that was used to
    /// produce the aggregation (e.g., [`AggregationKind::SUM`]).
    ///
    /// [`Aggregator`]: crate::metrics::aggregators::Aggregator
    fn kind(&self) -> &AggregationKind;
}

/// Sum returns an aggregated sum.
pub trait Sum<T>: Aggregation {
    /// The sum of the checkpointed values
    fn sum(&self) -> Result<T>;
}

/// Count returns the number of values that were aggregated.
pub trait Count: Aggregation {
    /// The count of the checkpointed values
    fn count(&self) -> Result<u64>;
}

/// Min returns the minimum value in the checkpoint.
pub trait Min<T>: Aggregation {
    /// The smallest checkpointed value
    fn min(&self) -> Result<T>;
}

/// Max returns the maximum value in the checkpoint.
pub trait Max<T>: Aggregation {
    /// The largest checkpointed value
    fn max(&self) -> Result<T>;
}

/// Quantile returns an exact or estimated quantile over the checkpoint.
pub trait Quantile<T>: Aggregation {
    /// The value at quantile `q`. Fails with `InvalidQuantile` when `q` is
    /// outside `[0, 1]`.
    fn quantile(&self, q: f64) -> Result<T>;
}

/// LastValue returns the latest value that was aggregated.
pub trait LastValue<T>: Aggregation {
    /// The last value and the time it was observed
    fn last_value(&self) -> Result<(T, SystemTime)>;
}

/// Points returns the raw set of values that were aggregated.
pub trait Points<T>: Aggregation {
    /// The checkpointed values in ascending order
    fn points(&self) -> Result<Vec<T>>;
}

/// MinMaxSumCount supports the Min, Max, Sum, and Count interfaces.
pub trait MinMaxSumCount<T>: Min<T> + Max<T> + Sum<T> + Count {}

/// Distribution supports the Min, Max, Sum, Count, and Quantile interfaces.
pub trait Distribution<T>: MinMaxSumCount<T> + Quantile<T> {}

/// A short name for the [`Aggregator`] that produces an [`Aggregation`].
///
/// Kind is a string to allow user-defined Aggregators.
///
/// [`Aggregator`]: crate::metrics::aggregators::Aggregator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationKind(&'static str);

impl AggregationKind {
    /// Aggregations that return an aggregated sum.
    pub const SUM: Self = AggregationKind("SUM");

    /// Aggregations that return only the latest value.
    pub const LAST_VALUE: Self = AggregationKind("LAST_VALUE");

    /// Aggregations that return min, max, sum and count.
    pub const MIN_MAX_SUM_COUNT: Self = AggregationKind("MIN_MAX_SUM_COUNT");

    /// Aggregations that keep every value and return an exact distribution.
    pub const ARRAY: Self = AggregationKind("ARRAY");

    /// Create a new custom aggregation kind
    pub const fn new(name: &'static str) -> Self {
        AggregationKind(name)
    }

    /// The name of this kind.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}
