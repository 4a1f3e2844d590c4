//! # Adaptable Bus Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | string tier | text frame resolving a one-time waiter, awaited |
//! | durable tier | parse + classify + one durable consumer |
//! | fan-out | one frame to many durable consumers |
//! | unhandled | frame nobody subscribed for |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use twin_bus::{AdaptableBus, BusConfig, Classification, UnhandledReason};
use twin_tests::fixtures::{client_bus, live_command_frame, twin_event_frame};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn bench_string_tier(c: &mut Criterion) {
    let rt = runtime();
    let bus = rt.block_on(async { client_bus("bench") }).unwrap();
    let tag = Classification::for_string("START-SEND-EVENTS:ACK");

    // Driven per iteration so cancelled timeout tasks are reaped.
    c.bench_function("string_tier_resolution", |b| {
        b.iter(|| {
            rt.block_on(async {
                let waiter = bus.subscribe_once_for_string(tag.clone(), Duration::from_secs(60));
                bus.publish(black_box("START-SEND-EVENTS:ACK"));
                black_box(waiter.await)
            })
        })
    });
}

fn bench_durable_tier(c: &mut Criterion) {
    let rt = runtime();
    let _guard = rt.enter();
    let bus = client_bus("bench").unwrap();
    let delivered = Arc::new(AtomicUsize::new(0));
    let delivered_clone = Arc::clone(&delivered);
    bus.subscribe_for_adaptable(
        Classification::for_topic_kind("things/live/commands"),
        move |_| {
            delivered_clone.fetch_add(1, Ordering::Relaxed);
        },
    );
    let frame = live_command_frame("org.acme:lamp", "modify", Some("c-1"), &["custom-a"]);

    let mut group = c.benchmark_group("durable_tier");
    group.throughput(Throughput::Elements(1));
    group.bench_function("live_command", |b| b.iter(|| bus.publish(black_box(&frame))));
    group.finish();
}

fn bench_fan_out(c: &mut Criterion) {
    let rt = runtime();
    let _guard = rt.enter();
    let frame = twin_event_frame("org.acme:lamp", json!({"on": true}));

    let mut group = c.benchmark_group("fan_out");
    for subscribers in [1usize, 10, 100] {
        let bus = client_bus("bench").unwrap();
        for _ in 0..subscribers {
            bus.subscribe_for_adaptable(
                Classification::for_topic_kind("things/twin/events"),
                |adaptable| {
                    black_box(adaptable);
                },
            );
        }
        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, _| b.iter(|| bus.publish(black_box(&frame))),
        );
    }
    group.finish();
}

fn bench_unhandled(c: &mut Criterion) {
    let rt = runtime();
    let _guard = rt.enter();
    let bus = AdaptableBus::builder()
        .config(BusConfig::named("bench"))
        .unhandled_sink(|raw: &str, reason: &UnhandledReason| {
            black_box((raw, reason));
        })
        .build()
        .unwrap();

    c.bench_function("unhandled_frame", |b| {
        b.iter(|| bus.publish(black_box("not a protocol frame")))
    });
}

criterion_group!(
    benches,
    bench_string_tier,
    bench_durable_tier,
    bench_fan_out,
    bench_unhandled
);
criterion_main!(benches);
