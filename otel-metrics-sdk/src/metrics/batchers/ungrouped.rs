//! A batcher that groups by the complete label set of each record.
use super::{stateful_from_env, Batch};
use crate::export::metrics::{AggregatorSelector, Batcher, CheckpointSet, LockedBatcher, Record};
use otel_metrics::labels::{default_encoder, Encoder};
use otel_metrics::metrics::Result;
use std::sync::{Mutex, MutexGuard};

/// Create a new ungrouped batcher builder.
pub fn ungrouped(selector: Box<dyn AggregatorSelector + Send + Sync>) -> UngroupedBatcherBuilder {
    UngroupedBatcherBuilder {
        selector,
        stateful: stateful_from_env(),
        encoder: None,
    }
}

/// Configuration for an [`UngroupedBatcher`].
#[derive(Debug)]
pub struct UngroupedBatcherBuilder {
    selector: Box<dyn AggregatorSelector + Send + Sync>,
    stateful: bool,
    encoder: Option<Box<dyn Encoder + Send + Sync>>,
}

impl UngroupedBatcherBuilder {
    /// Keep aggregates across collections and export cumulative values.
    ///
    /// This option overrides any value set for the
    /// `OTEL_METRICS_BATCHER_MEMORY` environment variable.
    pub fn with_stateful(mut self, stateful: bool) -> Self {
        self.stateful = stateful;
        self
    }

    /// Encode label sets with `encoder` instead of the default encoder.
    pub fn with_encoder(mut self, encoder: Box<dyn Encoder + Send + Sync>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Create an [`UngroupedBatcher`] with the given config.
    pub fn build(self) -> UngroupedBatcher {
        UngroupedBatcher {
            selector: self.selector,
            stateful: self.stateful,
            encoder: self.encoder.unwrap_or_else(default_encoder),
            batch: Mutex::new(Batch::default()),
        }
    }
}

/// Groups records by instrument and complete label set.
#[derive(Debug)]
pub struct UngroupedBatcher {
    selector: Box<dyn AggregatorSelector + Send + Sync>,
    stateful: bool,
    encoder: Box<dyn Encoder + Send + Sync>,
    batch: Mutex<Batch>,
}

impl UngroupedBatcher {
    /// Lock this batcher to return a mutable locked batcher
    pub fn lock(&self) -> Result<UngroupedLockedBatcher<'_>> {
        self.batch
            .lock()
            .map_err(From::from)
            .map(|locked| UngroupedLockedBatcher {
                parent: self,
                batch: locked,
            })
    }

    /// Whether aggregates are kept across collections.
    pub fn stateful(&self) -> bool {
        self.stateful
    }
}

impl Batcher for UngroupedBatcher {
    fn aggregator_selector(&self) -> &dyn AggregatorSelector {
        self.selector.as_ref()
    }
}

/// A locked representation of the batcher used where mutable references are
/// necessary.
#[derive(Debug)]
pub struct UngroupedLockedBatcher<'a> {
    parent: &'a UngroupedBatcher,
    batch: MutexGuard<'a, Batch>,
}

impl LockedBatcher for UngroupedLockedBatcher<'_> {
    fn process(&mut self, record: Record) -> Result<()> {
        let labels = record.labels().clone();
        let encoded = labels.encoded(Some(&*self.parent.encoder));
        self.batch.process(
            record,
            labels,
            encoded,
            self.parent.stateful,
            self.parent.selector.as_ref(),
        )
    }

    fn checkpoint_set(&mut self) -> &mut dyn CheckpointSet {
        &mut *self.batch
    }

    fn finished_collection(&mut self) {
        self.batch.finished_collection(self.parent.stateful)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::aggregators::AnyAggregator;
    use crate::metrics::selectors::simple;
    use otel_metrics::labels::LabelSet;
    use otel_metrics::metrics::{Descriptor, InstrumentKind, NumberKind};
    use otel_metrics::KeyValue;
    use std::sync::Arc;

    fn counter_record(
        descriptor: &Arc<Descriptor>,
        labels: &[KeyValue],
        value: i64,
    ) -> Record {
        let aggregator = simple::inexpensive()
            .aggregator_for(descriptor)
            .unwrap();
        aggregator.update(value, descriptor).unwrap();
        aggregator.checkpoint(descriptor);
        Record::new(
            Arc::clone(descriptor),
            LabelSet::from(labels),
            Arc::new(aggregator),
        )
    }

    fn sums(set: &mut dyn CheckpointSet) -> Vec<(String, i64)> {
        let encoder = default_encoder();
        let mut out = Vec::new();
        set.try_for_each(&mut |record| {
            let sum = match record.aggregator().as_ref() {
                AnyAggregator::I64(agg) => agg.as_sum().map(|s| s.sum()),
                AnyAggregator::F64(_) => None,
            };
            out.push((record.labels().encoded(Some(&*encoder)), sum.unwrap()?));
            Ok(())
        })
        .unwrap();
        out.sort();
        out
    }

    fn requests() -> Arc<Descriptor> {
        Arc::new(Descriptor::new(
            "requests",
            InstrumentKind::Counter,
            NumberKind::I64,
        ))
    }

    #[test]
    fn duplicate_keys_are_merged_when_stateless() {
        let batcher = ungrouped(Box::new(simple::inexpensive()))
            .with_stateful(false)
            .build();
        let descriptor = requests();
        let mut locked = batcher.lock().unwrap();

        locked
            .process(counter_record(&descriptor, &[KeyValue::new("A", "B")], 3))
            .unwrap();
        locked
            .process(counter_record(&descriptor, &[KeyValue::new("A", "B")], 4))
            .unwrap();
        locked
            .process(counter_record(&descriptor, &[KeyValue::new("A", "C")], 5))
            .unwrap();

        assert_eq!(
            sums(locked.checkpoint_set()),
            vec![("A=B".to_string(), 7), ("A=C".to_string(), 5)]
        );

        locked.finished_collection();
        assert!(sums(locked.checkpoint_set()).is_empty());
    }

    #[test]
    fn labels_differing_in_value_type_stay_separate() {
        let batcher = ungrouped(Box::new(simple::inexpensive()))
            .with_stateful(false)
            .build();
        let descriptor = requests();
        let mut locked = batcher.lock().unwrap();

        locked
            .process(counter_record(&descriptor, &[KeyValue::new("A", "1")], 1))
            .unwrap();
        locked
            .process(counter_record(&descriptor, &[KeyValue::new("A", 1i64)], 2))
            .unwrap();
        locked
            .process(counter_record(&descriptor, &[KeyValue::new("A", true)], 4))
            .unwrap();
        locked
            .process(counter_record(&descriptor, &[KeyValue::new("A", "true")], 8))
            .unwrap();

        assert_eq!(
            sums(locked.checkpoint_set()),
            vec![
                ("A=1".to_string(), 1),
                ("A=\\btrue".to_string(), 4),
                ("A=\\i1".to_string(), 2),
                ("A=true".to_string(), 8),
            ]
        );
    }

    #[test]
    fn stateful_accumulates_across_collections() {
        let batcher = ungrouped(Box::new(simple::inexpensive()))
            .with_stateful(true)
            .build();
        let descriptor = requests();
        let labels = [KeyValue::new("A", "B")];

        for expected in [10, 20] {
            let mut locked = batcher.lock().unwrap();
            locked
                .process(counter_record(&descriptor, &labels, 10))
                .unwrap();
            assert_eq!(sums(locked.checkpoint_set()), vec![("A=B".to_string(), expected)]);
            locked.finished_collection();
        }

        let mut locked = batcher.lock().unwrap();
        assert_eq!(sums(locked.checkpoint_set()), vec![("A=B".to_string(), 20)]);
    }

    #[test]
    fn stateful_copies_are_independent_of_the_source() {
        let batcher = ungrouped(Box::new(simple::inexpensive()))
            .with_stateful(true)
            .build();
        let descriptor = requests();
        let record = counter_record(&descriptor, &[], 10);
        let source = Arc::clone(record.aggregator());

        let mut locked = batcher.lock().unwrap();
        locked.process(record).unwrap();

        // the next checkpoint of the source finds nothing new
        source.checkpoint(&descriptor);
        assert!(!source.has_checkpoint());
        assert_eq!(sums(locked.checkpoint_set()), vec![(String::new(), 10)]);
    }

    #[test]
    fn disabled_instruments_are_dropped_when_stateful() {
        #[derive(Debug)]
        struct Disabled;
        impl AggregatorSelector for Disabled {
            fn aggregator_for(&self, _descriptor: &Descriptor) -> Option<AnyAggregator> {
                None
            }
        }

        let batcher = ungrouped(Box::new(Disabled)).with_stateful(true).build();
        let descriptor = requests();
        let mut locked = batcher.lock().unwrap();
        locked
            .process(counter_record(&descriptor, &[], 1))
            .unwrap();

        assert!(sums(locked.checkpoint_set()).is_empty());
    }

    #[test]
    fn records_without_data_are_skipped() {
        let batcher = ungrouped(Box::new(simple::inexpensive()))
            .with_stateful(false)
            .build();
        let descriptor = requests();
        let aggregator = simple::inexpensive().aggregator_for(&descriptor).unwrap();
        aggregator.checkpoint(&descriptor);

        let mut locked = batcher.lock().unwrap();
        locked
            .process(Record::new(
                Arc::clone(&descriptor),
                LabelSet::default(),
                Arc::new(aggregator),
            ))
            .unwrap();

        let mut calls = 0;
        locked
            .checkpoint_set()
            .try_for_each(&mut |_| {
                calls += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn custom_encoder_defines_the_grouping_key() {
        #[derive(Debug)]
        struct KeysOnly(otel_metrics::labels::EncoderId);
        impl Encoder for KeysOnly {
            fn encode(&self, labels: &mut dyn Iterator<Item = &KeyValue>) -> String {
                labels
                    .map(|kv| kv.key.as_str().to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            }
            fn id(&self) -> otel_metrics::labels::EncoderId {
                self.0
            }
        }

        let batcher = ungrouped(Box::new(simple::inexpensive()))
            .with_stateful(false)
            .with_encoder(Box::new(KeysOnly(otel_metrics::labels::new_encoder_id())))
            .build();
        let descriptor = requests();
        let mut locked = batcher.lock().unwrap();
        locked
            .process(counter_record(&descriptor, &[KeyValue::new("A", "B")], 1))
            .unwrap();
        locked
            .process(counter_record(&descriptor, &[KeyValue::new("A", "C")], 2))
            .unwrap();

        // both label sets encode to "A", the first one seen is exported
        assert_eq!(sums(locked.checkpoint_set()), vec![("A=B".to_string(), 3)]);
    }

    #[test]
    fn mismatched_aggregators_fail_the_record_only() {
        let batcher = ungrouped(Box::new(simple::exact()))
            .with_stateful(false)
            .build();
        let descriptor = requests();
        let mut locked = batcher.lock().unwrap();
        locked
            .process(counter_record(&descriptor, &[], 1))
            .unwrap();

        let foreign = simple::exact()
            .aggregator_for(&Descriptor::new("m", InstrumentKind::Measure, NumberKind::I64))
            .unwrap();
        let result = locked.process(Record::new(
            Arc::clone(&descriptor),
            LabelSet::default(),
            Arc::new(foreign),
        ));

        assert!(result.is_err());
        assert_eq!(sums(locked.checkpoint_set()), vec![(String::new(), 1)]);
    }
}
