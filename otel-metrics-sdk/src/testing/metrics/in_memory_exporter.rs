use crate::export::metrics::{Aggregation, AggregationKind, CheckpointSet, Exporter, Record};
use crate::metrics::aggregators::{Aggregator, AnyAggregator};
use otel_metrics::labels::{default_encoder, Encoder};
use otel_metrics::metrics::{MetricsError, Number, NumberKind, Result};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// A snapshot of one exported record. Numbers are coerced to `f64`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedRecord {
    /// The instrument name.
    pub name: String,
    /// The labels, encoded by the exporter's encoder.
    pub labels: String,
    /// The aggregation that produced the values.
    pub kind: AggregationKind,
    /// The number kind of the instrument.
    pub number_kind: NumberKind,
    /// Checkpointed sum, for aggregations that keep one.
    pub sum: Option<f64>,
    /// Checkpointed count, for aggregations that keep one.
    pub count: Option<u64>,
    /// Checkpointed minimum, for aggregations that keep one.
    pub min: Option<f64>,
    /// Checkpointed maximum, for aggregations that keep one.
    pub max: Option<f64>,
    /// Checkpointed last value and its timestamp, for last value aggregations.
    pub last_value: Option<(f64, SystemTime)>,
    /// Checkpointed points in ascending order, for array aggregations.
    pub points: Option<Vec<f64>>,
}

/// An in-memory metrics exporter that stores exported records in memory.
///
/// This exporter is useful for testing and debugging purposes. Every export
/// appends one [`ExportedRecord`] per record of the checkpoint set. Records
/// can be retrieved using the `get_finished_records` method.
///
/// # Example
///
/// ```
/// # use otel_metrics_sdk::export::metrics::{Exporter, LockedBatcher};
/// # use otel_metrics_sdk::metrics::{batchers::ungrouped, selectors::simple, Accumulator};
/// # use otel_metrics_sdk::testing::metrics::InMemoryExporter;
/// # use otel_metrics::metrics::{Descriptor, InstrumentKind, NumberKind};
/// # use otel_metrics::KeyValue;
/// # use std::sync::Arc;
/// let batcher = Arc::new(ungrouped(Box::new(simple::inexpensive())).build());
/// let accumulator = Accumulator::new(batcher.clone());
/// let exporter = InMemoryExporter::default();
///
/// let counter = Arc::new(Descriptor::new("requests", InstrumentKind::Counter, NumberKind::I64));
/// accumulator.record_one(&counter, 1i64, &[KeyValue::new("key", "value")]);
///
/// let mut locked = batcher.lock().unwrap();
/// accumulator.collect(&mut locked);
/// exporter.export(locked.checkpoint_set()).unwrap();
///
/// let finished = exporter.get_finished_records().unwrap();
/// assert_eq!(finished[0].labels, "key=value");
/// assert_eq!(finished[0].sum, Some(1.0));
/// ```
#[derive(Clone)]
pub struct InMemoryExporter {
    records: Arc<Mutex<Vec<ExportedRecord>>>,
    encoder: Arc<dyn Encoder + Send + Sync>,
}

impl fmt::Debug for InMemoryExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryExporter").finish()
    }
}

impl Default for InMemoryExporter {
    fn default() -> Self {
        InMemoryExporterBuilder::new().build()
    }
}

/// Builder for [`InMemoryExporter`].
#[derive(Debug, Default)]
pub struct InMemoryExporterBuilder {
    encoder: Option<Box<dyn Encoder + Send + Sync>>,
}

impl InMemoryExporterBuilder {
    /// Creates a new instance of the `InMemoryExporterBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode exported label sets with `encoder`.
    pub fn with_encoder(mut self, encoder: Box<dyn Encoder + Send + Sync>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Creates a new instance of the `InMemoryExporter`.
    pub fn build(self) -> InMemoryExporter {
        InMemoryExporter {
            records: Arc::new(Mutex::new(Vec::new())),
            encoder: Arc::from(self.encoder.unwrap_or_else(default_encoder)),
        }
    }
}

impl InMemoryExporter {
    /// Returns every record exported so far.
    ///
    /// # Errors
    ///
    /// Returns a `MetricsError` if the internal lock cannot be acquired.
    pub fn get_finished_records(&self) -> Result<Vec<ExportedRecord>> {
        self.records
            .lock()
            .map(|records| records.clone())
            .map_err(MetricsError::from)
    }

    /// Clears the internal storage of exported records.
    pub fn reset(&self) {
        let _ = self.records.lock().map(|mut records| records.clear());
    }

    fn snapshot(&self, record: &Record) -> ExportedRecord {
        let (sum, count, min, max, last_value, points) = match &**record.aggregator() {
            AnyAggregator::I64(agg) => values(agg),
            AnyAggregator::F64(agg) => values(agg),
        };

        ExportedRecord {
            name: record.descriptor().name().to_string(),
            labels: record.labels().encoded(Some(&*self.encoder)),
            kind: record.aggregator().kind().clone(),
            number_kind: record.aggregator().number_kind(),
            sum,
            count,
            min,
            max,
            last_value,
            points,
        }
    }
}

type Values = (
    Option<f64>,
    Option<u64>,
    Option<f64>,
    Option<f64>,
    Option<(f64, SystemTime)>,
    Option<Vec<f64>>,
);

fn values<T: Number>(agg: &Aggregator<T>) -> Values {
    let sum = agg.as_sum().and_then(|a| a.sum().ok()).map(Number::into_f64);
    let count = agg.as_count().and_then(|a| a.count().ok());
    let (min, max) = match agg.as_min_max_sum_count() {
        Some(a) => (
            a.min().ok().map(Number::into_f64),
            a.max().ok().map(Number::into_f64),
        ),
        None => (None, None),
    };
    let last_value = agg
        .as_last_value()
        .and_then(|a| a.last_value().ok())
        .map(|(value, timestamp)| (value.into_f64(), timestamp));
    let points = agg
        .as_points()
        .and_then(|a| a.points().ok())
        .map(|points| points.into_iter().map(Number::into_f64).collect());

    (sum, count, min, max, last_value, points)
}

impl Exporter for InMemoryExporter {
    fn export(&self, checkpoint_set: &mut dyn CheckpointSet) -> Result<()> {
        let mut exported = Vec::new();
        checkpoint_set.try_for_each(&mut |record| {
            exported.push(self.snapshot(record));
            Ok(())
        })?;

        self.records.lock()?.extend(exported);
        Ok(())
    }
}
