//! Metric Batchers
//!
//! A batcher groups the records checkpointed during one collection by
//! instrument and encoded label set. Records sharing a key are merged.
//!
//! A stateless batcher forgets everything once the collection finishes, so
//! each export holds the deltas of one collection. A stateful batcher keeps
//! its own copy of every aggregator and merges each new checkpoint on top,
//! so exports hold cumulative totals.
//!
//! The stateful default is read from `OTEL_METRICS_BATCHER_MEMORY`
//! (`true` or `false`) and can be overridden with the builders'
//! `with_stateful`.
use crate::export::metrics::{AggregatorSelector, CheckpointSet, Record};
use otel_metrics::labels::LabelSet;
use otel_metrics::metrics::{Descriptor, MetricsError, Result};
use otel_metrics::{otel_debug, otel_warn};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

pub mod defaultkeys;
pub mod ungrouped;

pub use defaultkeys::{defaultkeys, DefaultKeysBatcher, DefaultKeysBatcherBuilder};
pub use ungrouped::{ungrouped, UngroupedBatcher, UngroupedBatcherBuilder};

const BATCHER_MEMORY_NAME: &str = "OTEL_METRICS_BATCHER_MEMORY";

fn stateful_from_env() -> bool {
    match env::var(BATCHER_MEMORY_NAME) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" => true,
            "false" | "" => false,
            _ => {
                otel_warn!(
                    name: "Batcher.InvalidMemoryConfig",
                    value = value,
                    message = "expected `true` or `false`, using `false`"
                );
                false
            }
        },
        Err(_) => false,
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct BatchKey {
    descriptor: Arc<Descriptor>,
    labels: String,
}

/// The grouping map shared by the batchers.
#[derive(Debug, Default)]
struct Batch {
    values: HashMap<BatchKey, Record>,
}

impl Batch {
    /// Group `record` under `labels`, whose encoding is `encoded`.
    fn process(
        &mut self,
        record: Record,
        labels: LabelSet,
        encoded: String,
        stateful: bool,
        selector: &dyn AggregatorSelector,
    ) -> Result<()> {
        let descriptor = record.descriptor();
        let key = BatchKey {
            descriptor: Arc::clone(descriptor),
            labels: encoded,
        };

        if let Some(value) = self.values.get(&key) {
            // Identical keys arise from concurrent recordings and from label
            // sets that group together, so merge even when stateless.
            return value.aggregator().merge(record.aggregator(), descriptor);
        }

        let aggregator = if stateful {
            // AggregatorFor followed by Merge makes a private copy the SDK's
            // next checkpoint cannot overwrite.
            match selector.aggregator_for(descriptor) {
                Some(copy) => {
                    copy.merge(record.aggregator(), descriptor)?;
                    Arc::new(copy)
                }
                None => {
                    otel_debug!(
                        name: "Batcher.InstrumentDisabled",
                        instrument = descriptor.name()
                    );
                    return Ok(());
                }
            }
        } else {
            Arc::clone(record.aggregator())
        };

        let descriptor = Arc::clone(descriptor);
        self.values
            .insert(key, Record::new(descriptor, labels, aggregator));
        Ok(())
    }

    fn finished_collection(&mut self, stateful: bool) {
        if !stateful {
            self.values.clear();
        }
    }
}

impl CheckpointSet for Batch {
    fn try_for_each(&mut self, f: &mut dyn FnMut(&Record) -> Result<()>) -> Result<()> {
        for record in self.values.values() {
            if !record.aggregator().has_checkpoint() {
                continue;
            }
            match f(record) {
                Ok(()) | Err(MetricsError::NoDataCollected) => (),
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, false)]
    #[case(Some("true"), true)]
    #[case(Some("TRUE"), true)]
    #[case(Some(" false "), false)]
    #[case(Some("yes"), false)]
    fn stateful_default_from_env(#[case] value: Option<&str>, #[case] expected: bool) {
        temp_env::with_var(BATCHER_MEMORY_NAME, value, || {
            assert_eq!(stateful_from_env(), expected);
        });
    }
}
