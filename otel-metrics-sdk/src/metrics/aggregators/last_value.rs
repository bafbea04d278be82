use crate::export::metrics::{Aggregation, AggregationKind, LastValue};
use otel_metrics::metrics::{Descriptor, MetricsError, Number, Result};
use std::cmp::Ordering;
use std::sync::Mutex;
use std::time::SystemTime;

/// Create a new `LastValueAggregator`
pub fn last_value<T: Number>() -> LastValueAggregator<T> {
    LastValueAggregator::default()
}

/// Aggregates last value events.
///
/// The value and its timestamp are always read and written together.
#[derive(Debug, Default)]
pub struct LastValueAggregator<T: Number> {
    current: Mutex<Option<LastValueData<T>>>,
    checkpoint: Mutex<Option<LastValueData<T>>>,
}

#[derive(Clone, Copy, Debug)]
struct LastValueData<T> {
    value: T,
    timestamp: SystemTime,
}

impl<T: Number> LastValueAggregator<T> {
    /// Replace the current value.
    ///
    /// For monotonic instruments a value lower than the current one is
    /// rejected with [`MetricsError::NonMonotoneInput`] and the current value
    /// is kept.
    pub fn update(&self, number: T, descriptor: &Descriptor) -> Result<()> {
        let mut current = self.current.lock()?;
        if descriptor.monotonic() {
            if let Some(last) = current.as_ref() {
                if number.compare(&last.value) == Ordering::Less {
                    return Err(MetricsError::NonMonotoneInput);
                }
            }
        }

        *current = Some(LastValueData {
            value: number,
            timestamp: SystemTime::now(),
        });
        Ok(())
    }

    /// Copy the current value into the checkpoint.
    ///
    /// The current value is kept, so monotonic instruments keep rejecting
    /// lower values across collections.
    pub fn checkpoint(&self, _descriptor: &Descriptor) {
        let current = match self.current.lock() {
            Ok(current) => *current,
            Err(_) => return,
        };
        if let Ok(mut checkpoint) = self.checkpoint.lock() {
            *checkpoint = current;
        }
    }

    /// Keep whichever checkpoint was observed last. On equal timestamps this
    /// checkpoint wins.
    pub fn merge(&self, other: &LastValueAggregator<T>, _descriptor: &Descriptor) -> Result<()> {
        let theirs = match *other.checkpoint.lock()? {
            Some(theirs) => theirs,
            None => return Ok(()),
        };

        let mut ours = self.checkpoint.lock()?;
        let keep_ours = matches!(*ours, Some(data) if data.timestamp >= theirs.timestamp);
        if !keep_ours {
            *ours = Some(theirs);
        }
        Ok(())
    }
}

impl<T: Number> Aggregation for LastValueAggregator<T> {
    fn kind(&self) -> &AggregationKind {
        &AggregationKind::LAST_VALUE
    }
}

impl<T: Number> LastValue<T> for LastValueAggregator<T> {
    fn last_value(&self) -> Result<(T, SystemTime)> {
        self.checkpoint
            .lock()?
            .map(|data| (data.value, data.timestamp))
            .ok_or(MetricsError::NoDataCollected)
    }
}
