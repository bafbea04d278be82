use crate::export::metrics::{
    Aggregation, AggregationKind, Count, Distribution, Max, Min, MinMaxSumCount, Points, Quantile,
    Sum,
};
use otel_metrics::metrics::{Descriptor, MetricsError, Number, Result};
use std::mem;
use std::sync::Mutex;

/// Create a new default `ArrayAggregator`
pub fn array<T: Number>() -> ArrayAggregator<T> {
    ArrayAggregator::default()
}

/// An aggregator which stores metrics in an array.
///
/// Updates append under a lock. Sorting is deferred to `checkpoint`, which
/// swaps the buffer out and sorts it after releasing the lock.
#[derive(Debug, Default)]
pub struct ArrayAggregator<T: Number> {
    current: Mutex<Vec<T>>,
    checkpoint: Mutex<Option<PointsData<T>>>,
}

impl<T: Number> ArrayAggregator<T> {
    /// Append `number` to the current buffer.
    pub fn update(&self, number: T, _descriptor: &Descriptor) -> Result<()> {
        self.current.lock()?.push(number);
        Ok(())
    }

    /// Move the current buffer into the checkpoint, sorted and summed.
    pub fn checkpoint(&self, _descriptor: &Descriptor) {
        let points = match self.current.lock() {
            Ok(mut current) => mem::take(&mut *current),
            Err(_) => return,
        };
        let data = PointsData::from_unsorted(points);

        if let Ok(mut checkpoint) = self.checkpoint.lock() {
            *checkpoint = data;
        }
    }

    /// Merge the sorted checkpoint of `other` into this one.
    pub fn merge(&self, other: &ArrayAggregator<T>, _descriptor: &Descriptor) -> Result<()> {
        let theirs = match other.checkpoint.lock()?.as_ref() {
            Some(theirs) => theirs.clone(),
            None => return Ok(()),
        };

        let mut ours = self.checkpoint.lock()?;
        match ours.as_mut() {
            Some(data) => data.combine(&theirs),
            None => *ours = Some(theirs),
        }
        Ok(())
    }

    fn read<V>(&self, f: impl FnOnce(&PointsData<T>) -> Result<V>) -> Result<V> {
        self.checkpoint
            .lock()?
            .as_ref()
            .ok_or(MetricsError::NoDataCollected)
            .and_then(f)
    }
}

impl<T: Number> Aggregation for ArrayAggregator<T> {
    fn kind(&self) -> &AggregationKind {
        &AggregationKind::ARRAY
    }
}

impl<T: Number> Min<T> for ArrayAggregator<T> {
    fn min(&self) -> Result<T> {
        self.quantile(0.0)
    }
}

impl<T: Number> Max<T> for ArrayAggregator<T> {
    fn max(&self) -> Result<T> {
        self.quantile(1.0)
    }
}

impl<T: Number> Sum<T> for ArrayAggregator<T> {
    fn sum(&self) -> Result<T> {
        self.read(|data| Ok(data.sum))
    }
}

impl<T: Number> Count for ArrayAggregator<T> {
    fn count(&self) -> Result<u64> {
        self.read(|data| Ok(data.points.len() as u64))
    }
}

impl<T: Number> MinMaxSumCount<T> for ArrayAggregator<T> {}

impl<T: Number> Quantile<T> for ArrayAggregator<T> {
    fn quantile(&self, q: f64) -> Result<T> {
        self.read(|data| data.quantile(q))
    }
}

impl<T: Number> Distribution<T> for ArrayAggregator<T> {}

impl<T: Number> Points<T> for ArrayAggregator<T> {
    fn points(&self) -> Result<Vec<T>> {
        self.read(|data| Ok(data.points.clone()))
    }
}

/// A non-empty, sorted set of points and their sum.
#[derive(Clone, Debug)]
struct PointsData<T> {
    points: Vec<T>,
    sum: T,
}

impl<T: Number> PointsData<T> {
    fn from_unsorted(mut points: Vec<T>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        points.sort_by(|a, b| a.compare(b));
        let sum = points.iter().fold(T::default(), |acc, p| acc.add(*p));
        Some(PointsData { points, sum })
    }

    fn combine(&mut self, other: &PointsData<T>) {
        let mut merged = Vec::with_capacity(self.points.len() + other.points.len());
        let (mut ours, mut theirs) = (self.points.iter().peekable(), other.points.iter().peekable());
        while let (Some(a), Some(b)) = (ours.peek(), theirs.peek()) {
            if b.compare(a).is_lt() {
                merged.push(**b);
                theirs.next();
            } else {
                merged.push(**a);
                ours.next();
            }
        }
        merged.extend(ours);
        merged.extend(theirs);

        self.points = merged;
        self.sum = self.sum.add(other.sum);
    }

    /// Nearest rank quantile.
    fn quantile(&self, q: f64) -> Result<T> {
        if !(0.0..=1.0).contains(&q) {
            return Err(MetricsError::InvalidQuantile);
        }

        let position = ((self.points.len() - 1) as f64 * q).ceil() as usize;
        Ok(self.points[position.min(self.points.len() - 1)])
    }
}
