//! Fire fan-out benchmarks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use beacon_core::{SchedulerKind, Signal, SignalConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn fire_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fire");

    for listeners in [1usize, 8, 64, 512] {
        let signal = Signal::<u64>::with_config(
            SignalConfig { warn_listener_count: None, ..SignalConfig::default() }
                .scheduler(SchedulerKind::Inline),
        );
        let sink = Arc::new(AtomicU64::new(0));
        for _ in 0..listeners {
            let sink = sink.clone();
            signal
                .connect(move |n| {
                    sink.fetch_add(n, Ordering::Relaxed);
                })
                .unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(listeners), &listeners, |b, _| {
            b.iter(|| signal.fire(black_box(1)));
        });
    }

    group.finish();
}

fn connect_disconnect(c: &mut Criterion) {
    let signal = Signal::<u64>::new();

    c.bench_function("connect_disconnect", |b| {
        b.iter(|| {
            let connection = signal.connect(|n| {
                black_box(n);
            });
            if let Ok(connection) = connection {
                connection.disconnect();
            }
        });
    });
}

criterion_group!(benches, fire_fan_out, connect_disconnect);
criterion_main!(benches);
