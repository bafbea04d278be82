//! Simple Metric Selectors
use crate::export::metrics::AggregatorSelector;
use crate::metrics::aggregators::{self, Aggregator, AggregatorNumber, AnyAggregator};
use otel_metrics::metrics::{Descriptor, InstrumentKind, NumberKind};

/// A selector that uses sum, last value and min/max/sum/count aggregators.
pub fn inexpensive() -> Selector {
    Selector::Inexpensive
}

/// A selector that uses sum, last value and array aggregators.
pub fn exact() -> Selector {
    Selector::Exact
}

/// Aggregation selection strategies.
///
/// Counters are always summed and gauges and observers keep their last
/// value. The strategies differ in how measures are aggregated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector {
    /// Measures use the min/max/sum/count aggregator. This selector is faster
    /// and uses less memory than the others because it does not keep
    /// quantile information.
    Inexpensive,
    /// Measures use the array aggregator. This selector is able to compute
    /// exact quantiles.
    Exact,
}

impl Selector {
    fn build<T: AggregatorNumber>(&self, descriptor: &Descriptor) -> AnyAggregator {
        let aggregator: Aggregator<T> = match descriptor.instrument_kind() {
            InstrumentKind::Counter => Aggregator::Sum(aggregators::sum()),
            InstrumentKind::Gauge | InstrumentKind::Observer => {
                Aggregator::LastValue(aggregators::last_value())
            }
            InstrumentKind::Measure => match self {
                Selector::Inexpensive => {
                    Aggregator::MinMaxSumCount(aggregators::min_max_sum_count())
                }
                Selector::Exact => Aggregator::Array(aggregators::array()),
            },
        };
        T::upcast(aggregator)
    }
}

impl AggregatorSelector for Selector {
    fn aggregator_for(&self, descriptor: &Descriptor) -> Option<AnyAggregator> {
        Some(match descriptor.number_kind() {
            NumberKind::I64 => self.build::<i64>(descriptor),
            NumberKind::F64 => self.build::<f64>(descriptor),
        })
    }
}
