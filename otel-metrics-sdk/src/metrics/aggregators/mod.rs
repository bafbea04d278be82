//! Metric Aggregators
//!
//! Every aggregator keeps two states: `current`, updated concurrently by
//! instrumentation, and `checkpoint`, owned by the collection phase.
//! `checkpoint` moves `current` into `checkpoint` and is safe to call while
//! updates are in flight. `merge` combines another aggregator's checkpoint
//! into this one's.
use crate::export::metrics::{
    Aggregation, AggregationKind, Count, Distribution, LastValue, MinMaxSumCount, Points, Sum,
};
use otel_metrics::metrics::{Descriptor, MetricsError, Number, NumberKind, Result};

mod array;
mod last_value;
mod min_max_sum_count;
mod sum;

pub use array::{array, ArrayAggregator};
pub use last_value::{last_value, LastValueAggregator};
pub use min_max_sum_count::{min_max_sum_count, MinMaxSumCountAggregator};
pub use sum::{sum, SumAggregator};

/// RangeTest is a common routine for testing for valid input values. This
/// rejects NaN values. This rejects negative values when the metric instrument
/// does not support negative values, i.e. monotonic counters and monotonic
/// observers.
pub fn range_test<T: Number>(number: T, descriptor: &Descriptor) -> Result<()> {
    if number.is_nan() {
        return Err(MetricsError::NaNInput);
    }

    if descriptor.monotonic_sum() && number.is_negative() {
        return Err(MetricsError::NegativeInput);
    }

    Ok(())
}

/// Aggregator implements a specific aggregation behavior, i.e., a behavior to
/// track a sequence of updates to an instrument.
///
/// The set of aggregators is closed: every operation dispatches over the
/// variants, and merging two different variants fails with
/// [`MetricsError::InconsistentAggregator`].
#[derive(Debug)]
pub enum Aggregator<T: Number> {
    /// Sums every update.
    Sum(SumAggregator<T>),
    /// Keeps the last update and its timestamp.
    LastValue(LastValueAggregator<T>),
    /// Keeps min, max, sum and count of the updates.
    MinMaxSumCount(MinMaxSumCountAggregator<T>),
    /// Keeps every update.
    Array(ArrayAggregator<T>),
}

impl<T: Number> Aggregator<T> {
    /// Update receives a new measured value and incorporates it into the
    /// aggregation. Update calls may be called concurrently.
    pub fn update(&self, number: T, descriptor: &Descriptor) -> Result<()> {
        match self {
            Aggregator::Sum(agg) => agg.update(number, descriptor),
            Aggregator::LastValue(agg) => agg.update(number, descriptor),
            Aggregator::MinMaxSumCount(agg) => agg.update(number, descriptor),
            Aggregator::Array(agg) => agg.update(number, descriptor),
        }
    }

    /// Finish one period of aggregation by moving the current state into the
    /// checkpoint. May be called concurrently with `update`.
    pub fn checkpoint(&self, descriptor: &Descriptor) {
        match self {
            Aggregator::Sum(agg) => agg.checkpoint(descriptor),
            Aggregator::LastValue(agg) => agg.checkpoint(descriptor),
            Aggregator::MinMaxSumCount(agg) => agg.checkpoint(descriptor),
            Aggregator::Array(agg) => agg.checkpoint(descriptor),
        }
    }

    /// Combine the checkpointed state of `other` into this aggregator's
    /// checkpoint.
    pub fn merge(&self, other: &Aggregator<T>, descriptor: &Descriptor) -> Result<()> {
        match (self, other) {
            (Aggregator::Sum(agg), Aggregator::Sum(other)) => agg.merge(other, descriptor),
            (Aggregator::LastValue(agg), Aggregator::LastValue(other)) => {
                agg.merge(other, descriptor)
            }
            (Aggregator::MinMaxSumCount(agg), Aggregator::MinMaxSumCount(other)) => {
                agg.merge(other, descriptor)
            }
            (Aggregator::Array(agg), Aggregator::Array(other)) => agg.merge(other, descriptor),
            _ => Err(MetricsError::InconsistentAggregator(format!(
                "Expected {:?}, got: {:?}",
                self.kind(),
                other.kind()
            ))),
        }
    }

    /// `true` if the checkpoint holds data.
    pub fn has_checkpoint(&self) -> bool {
        match self {
            Aggregator::Sum(agg) => agg.sum().is_ok(),
            Aggregator::LastValue(agg) => agg.last_value().is_ok(),
            Aggregator::MinMaxSumCount(agg) => agg.count().is_ok(),
            Aggregator::Array(agg) => agg.count().is_ok(),
        }
    }

    /// The checkpointed sum, for aggregators that keep one.
    pub fn as_sum(&self) -> Option<&dyn Sum<T>> {
        match self {
            Aggregator::Sum(agg) => Some(agg),
            Aggregator::MinMaxSumCount(agg) => Some(agg),
            Aggregator::Array(agg) => Some(agg),
            Aggregator::LastValue(_) => None,
        }
    }

    /// The checkpointed count, for aggregators that keep one.
    pub fn as_count(&self) -> Option<&dyn Count> {
        match self {
            Aggregator::MinMaxSumCount(agg) => Some(agg),
            Aggregator::Array(agg) => Some(agg),
            _ => None,
        }
    }

    /// The checkpointed last value, for last value aggregators.
    pub fn as_last_value(&self) -> Option<&dyn LastValue<T>> {
        match self {
            Aggregator::LastValue(agg) => Some(agg),
            _ => None,
        }
    }

    /// Min, max, sum and count, for aggregators that keep all four.
    pub fn as_min_max_sum_count(&self) -> Option<&dyn MinMaxSumCount<T>> {
        match self {
            Aggregator::MinMaxSumCount(agg) => Some(agg),
            Aggregator::Array(agg) => Some(agg),
            _ => None,
        }
    }

    /// The exact distribution, for array aggregators.
    pub fn as_distribution(&self) -> Option<&dyn Distribution<T>> {
        match self {
            Aggregator::Array(agg) => Some(agg),
            _ => None,
        }
    }

    /// The raw checkpointed values, for array aggregators.
    pub fn as_points(&self) -> Option<&dyn Points<T>> {
        match self {
            Aggregator::Array(agg) => Some(agg),
            _ => None,
        }
    }
}

impl<T: Number> Aggregation for Aggregator<T> {
    fn kind(&self) -> &AggregationKind {
        match self {
            Aggregator::Sum(agg) => agg.kind(),
            Aggregator::LastValue(agg) => agg.kind(),
            Aggregator::MinMaxSumCount(agg) => agg.kind(),
            Aggregator::Array(agg) => agg.kind(),
        }
    }
}

/// An [`Aggregator`] over either number kind, so instruments of both kinds can
/// share one batcher.
#[derive(Debug)]
pub enum AnyAggregator {
    /// An aggregator of `i64` values.
    I64(Aggregator<i64>),
    /// An aggregator of `f64` values.
    F64(Aggregator<f64>),
}

impl AnyAggregator {
    /// The number kind this aggregator accepts.
    pub fn number_kind(&self) -> NumberKind {
        match self {
            AnyAggregator::I64(_) => NumberKind::I64,
            AnyAggregator::F64(_) => NumberKind::F64,
        }
    }

    /// The typed aggregator, if it aggregates `T`.
    pub fn downcast<T: AggregatorNumber>(&self) -> Option<&Aggregator<T>> {
        T::downcast(self)
    }

    /// Update with a number of the aggregator's own kind.
    ///
    /// Fails with [`MetricsError::InconsistentNumberKind`] when `T` is of the
    /// other kind.
    pub fn update<T: AggregatorNumber>(&self, number: T, descriptor: &Descriptor) -> Result<()> {
        match T::downcast(self) {
            Some(aggregator) => aggregator.update(number, descriptor),
            None => Err(MetricsError::InconsistentNumberKind {
                expected: self.number_kind(),
                found: T::KIND,
            }),
        }
    }

    /// See [`Aggregator::checkpoint`].
    pub fn checkpoint(&self, descriptor: &Descriptor) {
        match self {
            AnyAggregator::I64(agg) => agg.checkpoint(descriptor),
            AnyAggregator::F64(agg) => agg.checkpoint(descriptor),
        }
    }

    /// See [`Aggregator::merge`]. Aggregators of different number kinds never
    /// merge.
    pub fn merge(&self, other: &AnyAggregator, descriptor: &Descriptor) -> Result<()> {
        match (self, other) {
            (AnyAggregator::I64(agg), AnyAggregator::I64(other)) => agg.merge(other, descriptor),
            (AnyAggregator::F64(agg), AnyAggregator::F64(other)) => agg.merge(other, descriptor),
            _ => Err(MetricsError::InconsistentAggregator(format!(
                "Expected {:?} {:?}, got: {:?} {:?}",
                self.number_kind(),
                self.kind(),
                other.number_kind(),
                other.kind()
            ))),
        }
    }

    /// See [`Aggregator::has_checkpoint`].
    pub fn has_checkpoint(&self) -> bool {
        match self {
            AnyAggregator::I64(agg) => agg.has_checkpoint(),
            AnyAggregator::F64(agg) => agg.has_checkpoint(),
        }
    }
}

impl Aggregation for AnyAggregator {
    fn kind(&self) -> &AggregationKind {
        match self {
            AnyAggregator::I64(agg) => agg.kind(),
            AnyAggregator::F64(agg) => agg.kind(),
        }
    }
}

impl From<Aggregator<i64>> for AnyAggregator {
    fn from(aggregator: Aggregator<i64>) -> Self {
        AnyAggregator::I64(aggregator)
    }
}

impl From<Aggregator<f64>> for AnyAggregator {
    fn from(aggregator: Aggregator<f64>) -> Self {
        AnyAggregator::F64(aggregator)
    }
}

/// A [`Number`] that has a matching [`AnyAggregator`] variant.
pub trait AggregatorNumber: Number {
    /// Borrow the typed aggregator out of `aggregator`, if the kinds match.
    fn downcast(aggregator: &AnyAggregator) -> Option<&Aggregator<Self>>;

    /// Wrap a typed aggregator.
    fn upcast(aggregator: Aggregator<Self>) -> AnyAggregator;
}

impl AggregatorNumber for i64 {
    fn downcast(aggregator: &AnyAggregator) -> Option<&Aggregator<Self>> {
        match aggregator {
            AnyAggregator::I64(agg) => Some(agg),
            _ => None,
        }
    }

    fn upcast(aggregator: Aggregator<Self>) -> AnyAggregator {
        AnyAggregator::I64(aggregator)
    }
}

impl AggregatorNumber for f64 {
    fn downcast(aggregator: &AnyAggregator) -> Option<&Aggregator<Self>> {
        match aggregator {
            AnyAggregator::F64(agg) => Some(agg),
            _ => None,
        }
    }

    fn upcast(aggregator: Aggregator<Self>) -> AnyAggregator {
        AnyAggregator::F64(aggregator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otel_metrics::metrics::InstrumentKind;
    use rstest::rstest;

    #[rstest]
    #[case(InstrumentKind::Counter, true, -1.0, Err(MetricsError::NegativeInput))]
    #[case(InstrumentKind::Counter, false, -1.0, Ok(()))]
    #[case(InstrumentKind::Observer, true, -1.0, Err(MetricsError::NegativeInput))]
    #[case(InstrumentKind::Gauge, true, -1.0, Ok(()))]
    #[case(InstrumentKind::Measure, false, -1.0, Ok(()))]
    #[case(InstrumentKind::Counter, true, 0.0, Ok(()))]
    #[case(InstrumentKind::Counter, true, -0.0, Ok(()))]
    #[case(InstrumentKind::Measure, false, f64::NAN, Err(MetricsError::NaNInput))]
    #[case(InstrumentKind::Counter, true, f64::NAN, Err(MetricsError::NaNInput))]
    fn range_test_f64(
        #[case] kind: InstrumentKind,
        #[case] monotonic: bool,
        #[case] value: f64,
        #[case] expected: Result<()>,
    ) {
        let descriptor = Descriptor::new("test", kind, NumberKind::F64).with_monotonic(monotonic);
        assert_eq!(range_test(value, &descriptor), expected);
    }

    #[test]
    fn range_test_i64() {
        let counter = Descriptor::new("c", InstrumentKind::Counter, NumberKind::I64);
        assert_eq!(range_test(-5i64, &counter), Err(MetricsError::NegativeInput));
        assert_eq!(range_test(5i64, &counter), Ok(()));
    }

    #[test]
    fn merging_different_variants_fails() {
        let descriptor = Descriptor::new("m", InstrumentKind::Measure, NumberKind::I64);
        let a: Aggregator<i64> = Aggregator::Array(array());
        let b: Aggregator<i64> = Aggregator::MinMaxSumCount(min_max_sum_count());

        assert!(matches!(
            a.merge(&b, &descriptor),
            Err(MetricsError::InconsistentAggregator(_))
        ));
    }

    #[test]
    fn merging_different_number_kinds_fails() {
        let descriptor = Descriptor::new("c", InstrumentKind::Counter, NumberKind::I64);
        let a = AnyAggregator::from(Aggregator::<i64>::Sum(sum()));
        let b = AnyAggregator::from(Aggregator::<f64>::Sum(sum()));

        assert!(matches!(
            a.merge(&b, &descriptor),
            Err(MetricsError::InconsistentAggregator(_))
        ));
    }

    #[test]
    fn update_checks_number_kind() {
        let descriptor = Descriptor::new("c", InstrumentKind::Counter, NumberKind::I64);
        let agg = AnyAggregator::from(Aggregator::<i64>::Sum(sum()));

        assert_eq!(
            agg.update(1.5f64, &descriptor),
            Err(MetricsError::InconsistentNumberKind {
                expected: NumberKind::I64,
                found: NumberKind::F64,
            })
        );
        assert!(agg.update(3i64, &descriptor).is_ok());
        assert!(!agg.has_checkpoint());

        agg.checkpoint(&descriptor);
        assert!(agg.has_checkpoint());
        assert_eq!(agg.kind(), &AggregationKind::SUM);
        let sum = agg.downcast::<i64>().and_then(Aggregator::as_sum).map(|s| s.sum());
        assert_eq!(sum, Some(Ok(3)));
        assert!(agg.downcast::<f64>().is_none());
    }
}
