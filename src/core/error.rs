//! Error types for scheduler operations.

use thiserror::Error;

use crate::core::worker_pool::PoolError;
use crate::core::TaskState;
use crate::util::serde::TaskId;

/// Errors produced by scheduler components.
///
/// Failures raised by task bodies never surface here; they are attached to
/// the task that raised them (see `ScheduledTask::broken_cause`).
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No registered task has this id (it may already have been pruned).
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The operation is not permitted in the task's current state.
    #[error("illegal transition: cannot {operation} task {task} in state {from}")]
    IllegalTransition {
        /// Task the operation targeted.
        task: TaskId,
        /// State the task was in.
        from: TaskState,
        /// Operation that was refused.
        operation: &'static str,
    },
    /// The unit of work refused to be registered next to existing tasks of its type.
    #[error("submission rejected: a task of type `{task_type}` is already registered")]
    SubmissionRejected {
        /// Task type that refused concurrent submission.
        task_type: String,
    },
    /// A task with this id is already registered.
    #[error("duplicate task id: {0}")]
    DuplicateTask(TaskId),
    /// Schedule definition is malformed.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The owning scheduler has been shut down or dropped.
    #[error("scheduler has been shut down")]
    Shutdown,
    /// Worker pool refused the execution.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Persistence backend failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Application-facing result using anyhow for task bodies and collaborators.
pub type AppResult<T> = Result<T, anyhow::Error>;

/// Raised by [`TaskContext::check_canceled`](crate::core::TaskContext::check_canceled)
/// when the running task has been asked to stop.
#[derive(Debug, Error)]
#[error("task `{task}` was cancelled")]
pub struct TaskInterrupted {
    /// Name of the interrupted task.
    pub task: String,
}
