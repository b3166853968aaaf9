//! Tests for builder modules

use std::sync::Arc;

use prometheus_task_scheduler::config::{SchedulerConfig, WorkerPoolConfig};
use prometheus_task_scheduler::core::{AuditAction, InMemoryAuditSink, TaskConfigManager};
use prometheus_task_scheduler::infra::{InMemoryTaskConfigManager, TaskDefinition};
use prometheus_task_scheduler::{
    task_fn, Schedule, Scheduler, SchedulerError, SchedulerTask, TaskId, TaskState,
};

fn config() -> SchedulerConfig {
    SchedulerConfig {
        pool: WorkerPoolConfig::new().with_worker_count(2),
        poll_interval_ms: 50,
        max_results_per_task: None,
    }
}

#[test]
fn test_builder_defaults_build_empty_scheduler() {
    let scheduler = Scheduler::<u32>::builder(config()).build().unwrap();
    assert_eq!(scheduler.task_count(), 0);
    assert_eq!(scheduler.stats().worker_count, 2);
    scheduler.shutdown();
}

#[test]
fn test_builder_rejects_invalid_config() {
    let mut cfg = config();
    cfg.poll_interval_ms = 0;
    let result = Scheduler::<u32>::builder(cfg).build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_builder_restores_stored_tasks() {
    let manager = Arc::new(InMemoryTaskConfigManager::<u32>::new().with_factory(
        "cleanup",
        |_params| {
            let work: Arc<dyn SchedulerTask<u32>> = task_fn("cleanup", |_ctx| async { Ok(1_u32) });
            Ok(work)
        },
    ));
    manager.insert_definition(TaskDefinition {
        id: TaskId::from("nightly-cleanup"),
        name: "nightly cleanup".into(),
        task_type: "cleanup".into(),
        enabled: false,
        schedule: Schedule::manual(),
        parameters: Default::default(),
        last_run: None,
        next_run: None,
    });
    let audit = Arc::new(InMemoryAuditSink::new(64));

    let scheduler = Scheduler::builder(config())
        .with_config_manager(Arc::clone(&manager) as Arc<dyn TaskConfigManager<u32>>)
        .with_audit(audit.clone())
        .build()
        .unwrap();

    let task = scheduler.get_task_by_id(&TaskId::from("nightly-cleanup")).unwrap();
    assert_eq!(task.name(), "nightly cleanup");
    assert_eq!(task.state(), TaskState::Submitted);
    assert!(!task.is_enabled());
    assert_eq!(
        audit.actions_for(task.id()),
        vec![AuditAction::Submitted]
    );
    scheduler.shutdown();
}
