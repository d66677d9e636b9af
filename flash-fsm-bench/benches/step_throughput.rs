//! Per-tick cost of triggers, steps and the async driver

use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flash_fsm_bench::{phase_graph, ring_graph};
use flash_fsm_core::timer::{TokioTimer, drive};
use flash_fsm_core::{ExecutionContext, Machine, ManualClock, Millis, StepReport, Tick, TriggerId};

fn bench_triggers(c: &mut Criterion) {
    let mut group = c.benchmark_group("trigger");
    group.throughput(Throughput::Elements(1));
    let graph = ring_graph(8).unwrap();

    // Machine built once outside the loop
    group.bench_function("immediate", |b| {
        let mut ctx = ExecutionContext::new(&graph, 0u32, Millis(0));
        b.iter(|| ctx.trigger(black_box(TriggerId(0)), true, Millis(0)));
    });

    group.bench_function("queued_then_step", |b| {
        let mut ctx = ExecutionContext::new(&graph, 0u32, Millis(0));
        b.iter(|| {
            ctx.trigger(black_box(TriggerId(0)), false, Millis(0));
            ctx.step(Millis(0))
        });
    });

    group.bench_function("unknown_id", |b| {
        let mut ctx = ExecutionContext::new(&graph, 0u32, Millis(0));
        b.iter(|| ctx.trigger(black_box(TriggerId(1)), true, Millis(0)));
    });

    group.finish();
}

fn bench_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    let graph = phase_graph().unwrap();

    for instances in [1usize, 8, 64] {
        group.throughput(Throughput::Elements(instances as u64));
        group.bench_with_input(BenchmarkId::new("timed", instances), &instances, |b, &n| {
            let clock = ManualClock::new(0);
            let mut machines: Vec<_> = (0..n)
                .map(|_| Machine::begin(&graph, 0u32, &clock))
                .collect();
            b.iter(|| {
                clock.advance(1);
                machines
                    .iter_mut()
                    .map(|m| m.run())
                    .filter(StepReport::transitioned)
                    .count()
            });
        });
    }

    group.finish();
}

fn bench_drive(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let graph = phase_graph().unwrap();
    let graph = &graph;

    c.bench_function("drive_100_rounds", |b| {
        b.to_async(&runtime).iter(|| async move {
            let clock = ManualClock::new(0);
            let mut first = Machine::begin(graph, 0u32, &clock);
            let mut second = Machine::begin(graph, 0u32, &clock);
            let mut machines: [&mut dyn Tick; 2] = [&mut first, &mut second];
            let rounds = drive::<TokioTimer>(&mut machines, Duration::ZERO, Some(100));
            rounds.await
        });
    });
}

criterion_group!(benches, bench_triggers, bench_steps, bench_drive);
criterion_main!(benches);
