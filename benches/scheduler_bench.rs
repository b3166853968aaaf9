//! Benchmarks for the task scheduler.
//!
//! Benchmarks cover:
//! - Schedule iteration for calendar and interval schedules
//! - Task registration and registry snapshots
//! - End-to-end one-shot submission through the worker pool

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc, Weekday};
use prometheus_task_scheduler::config::{SchedulerConfig, WorkerPoolConfig};
use prometheus_task_scheduler::core::{
    task_fn, ExclusiveExecution, FnTask, Schedule, ScheduleIterator, Scheduler,
};

// ============================================================================
// Helpers
// ============================================================================

fn bench_scheduler(workers: usize) -> Scheduler<u64> {
    let config = SchedulerConfig {
        pool: WorkerPoolConfig::new()
            .with_worker_count(workers)
            .with_max_queue_depth(16_384),
        poll_interval_ms: 10,
        max_results_per_task: Some(1),
    };
    Scheduler::new(config).expect("scheduler")
}

fn walk(schedule: &Schedule, steps: u64) -> u64 {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let mut it = ScheduleIterator::new(schedule.clone(), start);
    let mut fired = 0;
    while fired < steps {
        let Some(next) = it.peek() else { break };
        black_box(it.commit(next));
        fired += 1;
    }
    fired
}

// ============================================================================
// Schedule Benchmarks
// ============================================================================

fn bench_schedule_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_iteration");
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let schedules = [
        ("every_30s", Schedule::every(start, None, Duration::from_secs(30))),
        ("daily", Schedule::daily(start, None)),
        (
            "weekly_weekdays",
            Schedule::weekly(
                start,
                None,
                [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
            ),
        ),
        ("monthly_1_15", Schedule::monthly(start, None, [1, 15])),
    ];

    for (name, schedule) in &schedules {
        group.throughput(Throughput::Elements(1_000));
        group.bench_with_input(BenchmarkId::from_parameter(name), schedule, |b, schedule| {
            b.iter(|| black_box(walk(schedule, 1_000)));
        });
    }
    group.finish();
}

// ============================================================================
// Registry Benchmarks
// ============================================================================

fn bench_register_manual_tasks(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_manual_tasks");

    for count in [100_u64, 1_000] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    let scheduler = bench_scheduler(2);
                    let began = Instant::now();
                    for i in 0..count {
                        let work = Arc::new(
                            FnTask::new("bench", |_ctx| async { Ok(0_u64) })
                                .with_policy(ExclusiveExecution),
                        );
                        black_box(
                            scheduler
                                .schedule(&format!("task-{i}"), work, Schedule::manual())
                                .unwrap(),
                        );
                    }
                    black_box(scheduler.summaries());
                    total += began.elapsed();
                    scheduler.shutdown();
                }
                total
            });
        });
    }
    group.finish();
}

// ============================================================================
// End-to-End Benchmarks
// ============================================================================

fn bench_submit_one_shot(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_one_shot");
    group.sample_size(10);

    for count in [100_u64, 1_000] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let scheduler = bench_scheduler(4);
            b.iter(|| {
                for i in 0..count {
                    scheduler
                        .submit("compute", task_fn("compute", move |_ctx| async move { Ok(i * 2) }))
                        .unwrap();
                }
                while scheduler.task_count() > 0 {
                    std::thread::yield_now();
                }
            });
            scheduler.shutdown();
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_schedule_iteration,
    bench_register_manual_tasks,
    bench_submit_one_shot,
);
criterion_main!(benches);
