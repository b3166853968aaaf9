//! Tests for API response models

use prometheus_task_scheduler::config::{SchedulerConfig, WorkerPoolConfig};
use prometheus_task_scheduler::runtime::{health, list_tasks, task_status, task_status_by_id};
use prometheus_task_scheduler::{task_fn, Schedule, Scheduler, SchedulerError, TaskId, TaskState};

fn scheduler() -> Scheduler<u32> {
    let config = SchedulerConfig {
        pool: WorkerPoolConfig::new().with_worker_count(2),
        poll_interval_ms: 50,
        max_results_per_task: None,
    };
    Scheduler::new(config).unwrap()
}

#[test]
fn test_task_status_reports_idle_manual_task() {
    let scheduler = scheduler();
    let task = scheduler
        .schedule("idle", task_fn("report", |_ctx| async { Ok(1_u32) }), Schedule::manual())
        .unwrap();

    let status = task_status(&task);
    assert_eq!(&status.task_id, task.id());
    assert_eq!(status.state, TaskState::Submitted);
    assert_eq!(status.next_run, None);
    assert_eq!(status.reason, None);

    let by_id = task_status_by_id(&scheduler, task.id()).unwrap();
    assert_eq!(by_id.state, TaskState::Submitted);
    assert!(matches!(
        task_status_by_id(&scheduler, &TaskId::from("missing")),
        Err(SchedulerError::TaskNotFound(_))
    ));
    scheduler.shutdown();
}

#[test]
fn test_list_tasks_groups_and_sorts_by_type() {
    let scheduler = scheduler();
    for (name, kind) in [("b1", "beta"), ("a1", "alpha"), ("b2", "beta")] {
        scheduler
            .schedule(name, task_fn(kind, |_ctx| async { Ok(0_u32) }), Schedule::manual())
            .unwrap();
    }

    let listings = list_tasks(&scheduler);
    let types: Vec<&str> = listings.iter().map(|l| l.task_type.as_str()).collect();
    assert_eq!(types, vec!["alpha", "beta"]);
    assert_eq!(listings[1].tasks.len(), 2);
    assert_eq!(listings[1].executing, 0);
    assert_eq!(listings[1].sleeping, 0);
    scheduler.shutdown();
}

#[test]
fn test_health_reflects_shutdown() {
    let scheduler = scheduler();
    scheduler
        .schedule("idle", task_fn("report", |_ctx| async { Ok(1_u32) }), Schedule::manual())
        .unwrap();

    let report = health(&scheduler);
    assert!(report.ok);
    assert_eq!(report.registered_tasks, 1);
    assert_eq!(report.active_tasks, 0);
    assert_eq!(report.pool.worker_count, 2);

    scheduler.shutdown();
    assert!(!health(&scheduler).ok);
}
