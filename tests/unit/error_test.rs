//! Tests for error types

use prometheus_task_scheduler::core::{PoolError, SchedulerError, TaskInterrupted, TaskState};
use prometheus_task_scheduler::TaskId;

#[test]
fn test_error_display() {
    let err = SchedulerError::TaskNotFound(TaskId::from("t1"));
    assert_eq!(err.to_string(), "task not found: t1");

    let err = SchedulerError::IllegalTransition {
        task: TaskId::from("t2"),
        from: TaskState::Finished,
        operation: "run_now",
    };
    assert_eq!(
        err.to_string(),
        "illegal transition: cannot run_now task t2 in state FINISHED"
    );

    let err = SchedulerError::SubmissionRejected {
        task_type: "reindex".into(),
    };
    assert!(err.to_string().contains("`reindex`"));

    let err = SchedulerError::Shutdown;
    assert_eq!(err.to_string(), "scheduler has been shut down");
}

#[test]
fn test_pool_error_converts() {
    let err: SchedulerError = PoolError::QueueFull.into();
    assert!(matches!(err, SchedulerError::Pool(PoolError::QueueFull)));
}

#[test]
fn test_task_interrupted_downcasts_through_anyhow() {
    let err: anyhow::Error = TaskInterrupted {
        task: "export".into(),
    }
    .into();
    assert!(err.is::<TaskInterrupted>());
    assert_eq!(err.to_string(), "task `export` was cancelled");
}
