use crate::export::metrics::{
    Aggregation, AggregationKind, Count, Max, Min, MinMaxSumCount, Sum,
};
use otel_metrics::metrics::{Descriptor, MetricsError, Number, Result};
use std::cmp::Ordering;
use std::mem;
use std::sync::Mutex;

/// Create a new `MinMaxSumCountAggregator`
pub fn min_max_sum_count<T: Number>() -> MinMaxSumCountAggregator<T> {
    MinMaxSumCountAggregator::default()
}

/// An `Aggregator` that aggregates events that form a distribution, keeping
/// only the min, max, sum, and count.
///
/// All four fields sit behind one lock, so a checkpoint always describes
/// exactly one set of updates.
#[derive(Debug, Default)]
pub struct MinMaxSumCountAggregator<T: Number> {
    current: Mutex<Option<State<T>>>,
    checkpoint: Mutex<Option<State<T>>>,
}

#[derive(Clone, Copy, Debug)]
struct State<T> {
    count: u64,
    sum: T,
    min: T,
    max: T,
}

impl<T: Number> State<T> {
    fn new(number: T) -> Self {
        State {
            count: 1,
            sum: number,
            min: number,
            max: number,
        }
    }

    fn combine(&mut self, other: &State<T>) {
        self.count = self.count.saturating_add(other.count);
        self.sum = self.sum.add(other.sum);
        if other.min.compare(&self.min) == Ordering::Less {
            self.min = other.min;
        }
        if other.max.compare(&self.max) == Ordering::Greater {
            self.max = other.max;
        }
    }
}

impl<T: Number> MinMaxSumCountAggregator<T> {
    /// Fold `number` into the current state.
    pub fn update(&self, number: T, _descriptor: &Descriptor) -> Result<()> {
        let mut current = self.current.lock()?;
        match current.as_mut() {
            Some(state) => state.combine(&State::new(number)),
            None => *current = Some(State::new(number)),
        }
        Ok(())
    }

    /// Move the current state into the checkpoint, leaving current empty.
    pub fn checkpoint(&self, _descriptor: &Descriptor) {
        let current = match self.current.lock() {
            Ok(mut current) => mem::take(&mut *current),
            Err(_) => return,
        };
        if let Ok(mut checkpoint) = self.checkpoint.lock() {
            *checkpoint = current;
        }
    }

    /// Combine the checkpoint of `other` into this checkpoint: counts and sums
    /// add up, min and max are kept.
    pub fn merge(
        &self,
        other: &MinMaxSumCountAggregator<T>,
        _descriptor: &Descriptor,
    ) -> Result<()> {
        let theirs = match *other.checkpoint.lock()? {
            Some(theirs) => theirs,
            None => return Ok(()),
        };

        let mut ours = self.checkpoint.lock()?;
        match ours.as_mut() {
            Some(state) => state.combine(&theirs),
            None => *ours = Some(theirs),
        }
        Ok(())
    }

    fn read<V>(&self, f: impl FnOnce(&State<T>) -> V) -> Result<V> {
        self.checkpoint
            .lock()?
            .as_ref()
            .map(f)
            .ok_or(MetricsError::NoDataCollected)
    }
}

impl<T: Number> Aggregation for MinMaxSumCountAggregator<T> {
    fn kind(&self) -> &AggregationKind {
        &AggregationKind::MIN_MAX_SUM_COUNT
    }
}

impl<T: Number> Min<T> for MinMaxSumCountAggregator<T> {
    fn min(&self) -> Result<T> {
        self.read(|state| state.min)
    }
}

impl<T: Number> Max<T> for MinMaxSumCountAggregator<T> {
    fn max(&self) -> Result<T> {
        self.read(|state| state.max)
    }
}

impl<T: Number> Sum<T> for MinMaxSumCountAggregator<T> {
    fn sum(&self) -> Result<T> {
        self.read(|state| state.sum)
    }
}

impl<T: Number> Count for MinMaxSumCountAggregator<T> {
    fn count(&self) -> Result<u64> {
        self.read(|state| state.count)
    }
}

impl<T: Number> MinMaxSumCount<T> for MinMaxSumCountAggregator<T> {}
