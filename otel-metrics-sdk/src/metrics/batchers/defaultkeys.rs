//! A batcher that groups by the recommended keys of each instrument.
//!
//! Labels outside the descriptor's keys are dropped. Keys the record does not
//! carry are exported with an empty string value, so every record of an
//! instrument is exported with exactly the same keys. An instrument without
//! recommended keys is grouped into a single empty label set.
use super::{stateful_from_env, Batch};
use crate::export::metrics::{AggregatorSelector, Batcher, CheckpointSet, LockedBatcher, Record};
use otel_metrics::labels::{default_encoder, Encoder};
use otel_metrics::metrics::Result;
use std::sync::{Mutex, MutexGuard};

/// Create a new defaultkeys batcher builder.
pub fn defaultkeys(
    selector: Box<dyn AggregatorSelector + Send + Sync>,
) -> DefaultKeysBatcherBuilder {
    DefaultKeysBatcherBuilder {
        selector,
        stateful: stateful_from_env(),
        encoder: None,
    }
}

/// Configuration for a [`DefaultKeysBatcher`].
#[derive(Debug)]
pub struct DefaultKeysBatcherBuilder {
    selector: Box<dyn AggregatorSelector + Send + Sync>,
    stateful: bool,
    encoder: Option<Box<dyn Encoder + Send + Sync>>,
}

impl DefaultKeysBatcherBuilder {
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

    /// Create a [`DefaultKeysBatcher`] with the given config.
    pub fn build(self) -> DefaultKeysBatcher {
        DefaultKeysBatcher {
            selector: self.selector,
            stateful: self.stateful,
            encoder: self.encoder.unwrap_or_else(default_encoder),
            batch: Mutex::new(Batch::default()),
        }
    }
}

/// Groups records by instrument and the instrument's recommended keys.
#[derive(Debug)]
pub struct DefaultKeysBatcher {
    selector: Box<dyn AggregatorSelector + Send + Sync>,
    stateful: bool,
    encoder: Box<dyn Encoder + Send + Sync>,
    batch: Mutex<Batch>,
}

impl DefaultKeysBatcher {
    /// Lock this batcher to return a mutable locked batcher
    pub fn lock(&self) -> Result<DefaultKeysLockedBatcher<'_>> {
        self.batch
            .lock()
            .map_err(From::from)
            .map(|locked| DefaultKeysLockedBatcher {
                parent: self,
                batch: locked,
            })
    }

    /// Whether aggregates are kept across collections.
    pub fn stateful(&self) -> bool {
        self.stateful
    }
}

impl Batcher for DefaultKeysBatcher {
    fn aggregator_selector(&self) -> &dyn AggregatorSelector {
        self.selector.as_ref()
    }
}

/// A locked representation of the batcher used where mutable references are
/// necessary.
#[derive(Debug)]
pub struct DefaultKeysLockedBatcher<'a> {
    parent: &'a DefaultKeysBatcher,
    batch: MutexGuard<'a, Batch>,
}

impl LockedBatcher for DefaultKeysLockedBatcher<'_> {
    fn process(&mut self, record: Record) -> Result<()> {
        let labels = record.labels().project(record.descriptor().keys());
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
