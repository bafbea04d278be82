//! # Metrics SDK
//!
//! The [`Accumulator`] owns one aggregator per instrument and label set.
//! Measurements are recorded into it concurrently; a single collection pass
//! checkpoints every aggregator updated since the previous pass and hands the
//! result to a [`LockedBatcher`].
use crate::export::metrics::{Batcher, LockedBatcher, Record};
use otel_metrics::labels::LabelSet;
use otel_metrics::metrics::{Descriptor, MetricsError, Result};
use otel_metrics::{otel_debug, otel_warn, KeyValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

pub mod aggregators;
pub mod batchers;
pub mod selectors;

use aggregators::{range_test, AggregatorNumber, AnyAggregator};

/// Accumulator records measurements into aggregators chosen by its
/// [`Batcher`], and feeds their checkpoints to the batcher on `collect`.
///
/// Cloning is cheap, clones share the same state.
#[derive(Clone, Debug)]
pub struct Accumulator(Arc<AccumulatorCore>);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MapKey {
    descriptor: Arc<Descriptor>,
    labels: LabelSet,
}

#[derive(Debug)]
struct AccumulatorRecord {
    aggregator: Arc<AnyAggregator>,
    /// Incremented after every successful update.
    update_count: AtomicU64,
    /// The update count seen by the last collection.
    collected_count: AtomicU64,
}

type ObserverCallback = dyn Fn(&ObserverResult<'_>) + Send + Sync;

struct Observer {
    descriptor: Arc<Descriptor>,
    callback: Box<ObserverCallback>,
}

struct AccumulatorCore {
    records: RwLock<HashMap<MapKey, Arc<AccumulatorRecord>>>,
    observers: Mutex<Vec<Arc<Observer>>>,
    batcher: Arc<dyn Batcher + Send + Sync>,
}

impl fmt::Debug for AccumulatorCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccumulatorCore")
            .field("records", &self.records)
            .field("batcher", &self.batcher)
            .finish()
    }
}

impl Accumulator {
    /// Create an accumulator bound to `batcher`.
    pub fn new(batcher: Arc<dyn Batcher + Send + Sync>) -> Self {
        Accumulator(Arc::new(AccumulatorCore {
            records: RwLock::new(HashMap::new()),
            observers: Mutex::new(Vec::new()),
            batcher,
        }))
    }

    /// Record one measurement.
    ///
    /// Measurements of the wrong number kind, NaN values and negative values
    /// for monotonic sums are dropped, as are measurements for instruments
    /// the batcher's selector disables. Nothing is returned to the caller.
    pub fn record_one<T: AggregatorNumber>(
        &self,
        descriptor: &Arc<Descriptor>,
        number: T,
        labels: &[KeyValue],
    ) {
        if *descriptor.number_kind() != T::KIND {
            otel_debug!(
                name: "Accumulator.MeasurementDropped",
                instrument = descriptor.name(),
                error = format!(
                    "{}",
                    MetricsError::InconsistentNumberKind {
                        expected: *descriptor.number_kind(),
                        found: T::KIND,
                    }
                )
            );
            return;
        }

        if let Err(err) = range_test(number, descriptor) {
            otel_debug!(
                name: "Accumulator.MeasurementDropped",
                instrument = descriptor.name(),
                error = format!("{err}")
            );
            return;
        }

        let record = match self.0.acquire(descriptor, LabelSet::from(labels)) {
            Some(record) => record,
            None => return,
        };

        match record.aggregator.update(number, descriptor) {
            Ok(()) => {
                record.update_count.fetch_add(1, Ordering::AcqRel);
            }
            Err(err) => {
                otel_debug!(
                    name: "Accumulator.MeasurementDropped",
                    instrument = descriptor.name(),
                    error = format!("{err}")
                );
            }
        }
    }

    /// Register a callback that reports observations for `descriptor` at the
    /// start of every collection.
    ///
    /// Fails with [`MetricsError::Config`] if `descriptor` is not an observer.
    pub fn register_observer<F>(&self, descriptor: Arc<Descriptor>, callback: F) -> Result<()>
    where
        F: Fn(&ObserverResult<'_>) + Send + Sync + 'static,
    {
        if !descriptor.instrument_kind().asynchronous() {
            return Err(MetricsError::Config(format!(
                "instrument {} is not an observer",
                descriptor.name()
            )));
        }

        self.0.observers.lock()?.push(Arc::new(Observer {
            descriptor,
            callback: Box::new(callback),
        }));
        Ok(())
    }

    /// Run the registered observers, then checkpoint every record updated
    /// since the last collection and pass it to `batcher`.
    ///
    /// Records without updates since the last collection are forgotten.
    /// Errors from `process` are logged and the sweep continues. Returns the
    /// number of records checkpointed.
    pub fn collect(&self, batcher: &mut dyn LockedBatcher) -> usize {
        self.observe();

        let records: Vec<(MapKey, Arc<AccumulatorRecord>)> = match self.0.records.read() {
            Ok(records) => records
                .iter()
                .map(|(key, record)| (key.clone(), Arc::clone(record)))
                .collect(),
            Err(err) => {
                otel_warn!(name: "Accumulator.CollectFailed", error = format!("{err}"));
                return 0;
            }
        };

        let mut checkpointed = 0;
        let mut stale = false;
        for (key, record) in &records {
            let updates = record.update_count.load(Ordering::Acquire);
            if updates == record.collected_count.load(Ordering::Acquire) {
                stale = true;
                continue;
            }

            record.aggregator.checkpoint(&key.descriptor);
            record.collected_count.store(updates, Ordering::Release);
            checkpointed += 1;

            let exported = Record::new(
                Arc::clone(&key.descriptor),
                key.labels.clone(),
                Arc::clone(&record.aggregator),
            );
            if let Err(err) = batcher.process(exported) {
                otel_warn!(
                    name: "Accumulator.ProcessFailed",
                    instrument = key.descriptor.name(),
                    error = format!("{err}")
                );
            }
        }
        drop(records);

        if stale {
            self.0.remove_stale();
        }

        checkpointed
    }

    fn observe(&self) {
        // run without holding the lock, so callbacks may register observers
        let observers = match self.0.observers.lock() {
            Ok(observers) => observers.clone(),
            Err(_) => return,
        };

        for observer in observers {
            let result = ObserverResult {
                accumulator: self,
                descriptor: &observer.descriptor,
            };
            (observer.callback)(&result);
        }
    }
}

impl AccumulatorCore {
    fn acquire(
        &self,
        descriptor: &Arc<Descriptor>,
        labels: LabelSet,
    ) -> Option<Arc<AccumulatorRecord>> {
        let key = MapKey {
            descriptor: Arc::clone(descriptor),
            labels,
        };
        if let Some(record) = self.records.read().ok()?.get(&key) {
            return Some(Arc::clone(record));
        }

        let aggregator = match self.batcher.aggregator_selector().aggregator_for(descriptor) {
            Some(aggregator) => aggregator,
            None => {
                otel_debug!(
                    name: "Accumulator.InstrumentDisabled",
                    instrument = descriptor.name()
                );
                return None;
            }
        };

        let mut records = self.records.write().ok()?;
        let record = records.entry(key).or_insert_with(|| {
            Arc::new(AccumulatorRecord {
                aggregator: Arc::new(aggregator),
                update_count: AtomicU64::new(0),
                collected_count: AtomicU64::new(0),
            })
        });
        Some(Arc::clone(record))
    }

    fn remove_stale(&self) {
        if let Ok(mut records) = self.records.write() {
            // a record held elsewhere may be about to be updated
            records.retain(|_, record| {
                Arc::strong_count(record) > 1
                    || record.update_count.load(Ordering::Acquire)
                        != record.collected_count.load(Ordering::Acquire)
            });
        }
    }
}

/// Handed to observer callbacks to report observations.
#[derive(Debug)]
pub struct ObserverResult<'a> {
    accumulator: &'a Accumulator,
    descriptor: &'a Arc<Descriptor>,
}

impl ObserverResult<'_> {
    /// Report `number` for the observed instrument under `labels`.
    pub fn observe<T: AggregatorNumber>(&self, number: T, labels: &[KeyValue]) {
        self.accumulator.record_one(self.descriptor, number, labels)
    }

    /// The observed instrument.
    pub fn descriptor(&self) -> &Descriptor {
        self.descriptor
    }
}
