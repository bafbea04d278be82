use criterion::{criterion_group, criterion_main, Criterion};
use otel_metrics::metrics::{Descriptor, InstrumentKind, NumberKind};
use otel_metrics::KeyValue;
use otel_metrics_sdk::export::metrics::{Exporter, LockedBatcher};
use otel_metrics_sdk::metrics::batchers::{defaultkeys, ungrouped};
use otel_metrics_sdk::metrics::selectors::simple;
use otel_metrics_sdk::metrics::Accumulator;
use otel_metrics_sdk::testing::metrics::InMemoryExporter;
use std::sync::Arc;

// Run this benchmark with:
// cargo bench --bench batcher --features=testing
fn record_all(accumulator: &Accumulator, descriptor: &Arc<Descriptor>) {
    // 10*10 = 100 label sets.
    for a in 0..10i64 {
        for b in 0..10i64 {
            accumulator.record_one(
                descriptor,
                1i64,
                &[KeyValue::new("A", a), KeyValue::new("B", b)],
            );
        }
    }
}

fn collect_and_export(
    accumulator: &Accumulator,
    batcher: &mut dyn LockedBatcher,
    exporter: &InMemoryExporter,
) {
    accumulator.collect(batcher);
    let _ = exporter.export(batcher.checkpoint_set());
    batcher.finished_collection();
    exporter.reset();
}

fn criterion_benchmark(c: &mut Criterion) {
    let descriptor = Arc::new(
        Descriptor::new("requests", InstrumentKind::Counter, NumberKind::I64).with_keys(["A"]),
    );
    let exporter = InMemoryExporter::default();

    for stateful in [false, true] {
        let batcher = Arc::new(
            ungrouped(Box::new(simple::inexpensive()))
                .with_stateful(stateful)
                .build(),
        );
        let accumulator = Accumulator::new(batcher.clone());
        c.bench_function(&format!("Ungrouped_Collect_Stateful_{stateful}"), |b| {
            b.iter(|| {
                record_all(&accumulator, &descriptor);
                if let Ok(mut locked) = batcher.lock() {
                    collect_and_export(&accumulator, &mut locked, &exporter);
                }
            })
        });

        let batcher = Arc::new(
            defaultkeys(Box::new(simple::inexpensive()))
                .with_stateful(stateful)
                .build(),
        );
        let accumulator = Accumulator::new(batcher.clone());
        c.bench_function(&format!("DefaultKeys_Collect_Stateful_{stateful}"), |b| {
            b.iter(|| {
                record_all(&accumulator, &descriptor);
                if let Ok(mut locked) = batcher.lock() {
                    collect_and_export(&accumulator, &mut locked, &exporter);
                }
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
