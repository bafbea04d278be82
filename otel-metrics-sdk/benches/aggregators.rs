use criterion::{criterion_group, criterion_main, Criterion};
use otel_metrics::metrics::{Descriptor, InstrumentKind, NumberKind};
use otel_metrics::KeyValue;
use otel_metrics_sdk::metrics::aggregators::{array, last_value, min_max_sum_count, sum};
use otel_metrics_sdk::metrics::batchers::ungrouped;
use otel_metrics_sdk::metrics::selectors::simple;
use otel_metrics_sdk::metrics::Accumulator;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    /// Store random number generator for each thread
    static CURRENT_RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

static ATTRIBUTE_VALUES: [&str; 10] = [
    "value1", "value2", "value3", "value4", "value5", "value6", "value7", "value8", "value9",
    "value10",
];

// Run this benchmark with:
// cargo bench --bench aggregators
fn criterion_benchmark(c: &mut Criterion) {
    aggregator_update(c);
    accumulator_record(c);
}

fn aggregator_update(c: &mut Criterion) {
    let counter = Descriptor::new("counter", InstrumentKind::Counter, NumberKind::I64);
    let measure = Descriptor::new("measure", InstrumentKind::Measure, NumberKind::F64);
    let gauge = Descriptor::new("gauge", InstrumentKind::Gauge, NumberKind::I64);

    let agg = sum::<i64>();
    c.bench_function("Sum_Update", |b| b.iter(|| agg.update(1, &counter)));

    let agg = last_value::<i64>();
    c.bench_function("LastValue_Update", |b| b.iter(|| agg.update(1, &gauge)));

    let agg = min_max_sum_count::<f64>();
    c.bench_function("MinMaxSumCount_Update", |b| {
        b.iter(|| {
            let value = CURRENT_RNG.with(|rng| rng.borrow_mut().random_range(0.0..100.0));
            agg.update(value, &measure)
        })
    });

    let agg = array::<f64>();
    c.bench_function("Array_Update_Checkpoint_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                let value = CURRENT_RNG.with(|rng| rng.borrow_mut().random_range(0.0..100.0));
                let _ = agg.update(value, &measure);
            }
            agg.checkpoint(&measure);
        })
    });
}

fn accumulator_record(c: &mut Criterion) {
    let batcher = Arc::new(ungrouped(Box::new(simple::inexpensive())).build());
    let accumulator = Accumulator::new(batcher);
    let counter = Arc::new(Descriptor::new(
        "counter_bench",
        InstrumentKind::Counter,
        NumberKind::I64,
    ));

    c.bench_function("Accumulator_Record_Sorted", |b| {
        b.iter(|| {
            // 4*4*10*10 = 1600 label sets.
            let indexes = CURRENT_RNG.with(|rng| {
                let mut rng = rng.borrow_mut();
                [
                    rng.random_range(0..4),
                    rng.random_range(0..4),
                    rng.random_range(0..10),
                    rng.random_range(0..10),
                ]
            });
            accumulator.record_one(
                &counter,
                1i64,
                &[
                    KeyValue::new("attribute1", ATTRIBUTE_VALUES[indexes[0]]),
                    KeyValue::new("attribute2", ATTRIBUTE_VALUES[indexes[1]]),
                    KeyValue::new("attribute3", ATTRIBUTE_VALUES[indexes[2]]),
                    KeyValue::new("attribute4", ATTRIBUTE_VALUES[indexes[3]]),
                ],
            );
        });
    });

    c.bench_function("Accumulator_Record_Unsorted", |b| {
        b.iter(|| {
            let indexes = CURRENT_RNG.with(|rng| {
                let mut rng = rng.borrow_mut();
                [
                    rng.random_range(0..4),
                    rng.random_range(0..4),
                    rng.random_range(0..10),
                    rng.random_range(0..10),
                ]
            });
            accumulator.record_one(
                &counter,
                1i64,
                &[
                    KeyValue::new("attribute2", ATTRIBUTE_VALUES[indexes[1]]),
                    KeyValue::new("attribute3", ATTRIBUTE_VALUES[indexes[2]]),
                    KeyValue::new("attribute1", ATTRIBUTE_VALUES[indexes[0]]),
                    KeyValue::new("attribute4", ATTRIBUTE_VALUES[indexes[3]]),
                ],
            );
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
