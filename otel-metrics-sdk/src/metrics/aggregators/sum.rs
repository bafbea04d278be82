use crate::export::metrics::{Aggregation, AggregationKind, Sum};
use otel_metrics::metrics::{AtomicTracker, Descriptor, MetricsError, Number, Result};

/// Create a new sum aggregator.
pub fn sum<T: Number>() -> SumAggregator<T> {
    SumAggregator::default()
}

/// An aggregator for counter events.
///
/// Both states are lock-free: `checkpoint` atomically takes the current sum
/// and resets it, so a racing update lands in exactly one checkpoint.
#[derive(Debug, Default)]
pub struct SumAggregator<T: Number> {
    current: AtomicTracker<T>,
    checkpoint: AtomicTracker<T>,
}

impl<T: Number> SumAggregator<T> {
    /// Atomically add `number` into the current sum.
    pub fn update(&self, number: T, _descriptor: &Descriptor) -> Result<()> {
        self.current.add(number);
        Ok(())
    }

    /// Move the current sum into the checkpoint.
    pub fn checkpoint(&self, _descriptor: &Descriptor) {
        self.checkpoint.take();
        if let Some(value) = self.current.take() {
            self.checkpoint.add(value);
        }
    }

    /// Add the checkpointed sum of `other` into this checkpoint.
    pub fn merge(&self, other: &SumAggregator<T>, _descriptor: &Descriptor) -> Result<()> {
        if let Some(value) = other.checkpoint.get() {
            self.checkpoint.add(value);
        }
        Ok(())
    }
}

impl<T: Number> Aggregation for SumAggregator<T> {
    fn kind(&self) -> &AggregationKind {
        &AggregationKind::SUM
    }
}

impl<T: Number> Sum<T> for SumAggregator<T> {
    fn sum(&self) -> Result<T> {
        self.checkpoint.get().ok_or(MetricsError::NoDataCollected)
    }
}
