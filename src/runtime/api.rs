//! API-facing response models built from scheduler state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{PoolStats, ScheduledTask, Scheduler, SchedulerError, TaskState, TaskSummary};
use crate::util::serde::TaskId;

/// Task status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    /// Task identifier.
    pub task_id: TaskId,
    /// Current state.
    pub state: TaskState,
    /// Outcome of the latest run.
    pub last_status: Option<TaskState>,
    /// Next scheduled trigger.
    pub next_run: Option<DateTime<Utc>>,
    /// Failure message when the task is broken.
    pub reason: Option<String>,
}

/// Tasks of one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTypeListing {
    /// Shared task type.
    pub task_type: String,
    /// Tasks in registration order.
    pub tasks: Vec<TaskSummary>,
    /// How many are running or cancelling.
    pub executing: usize,
    /// How many wait for admission.
    pub sleeping: usize,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Registered tasks.
    pub registered_tasks: usize,
    /// Running, cancelling or sleeping tasks.
    pub active_tasks: usize,
    /// Worker pool counters.
    pub pool: PoolStats,
}

/// Status of one task handle.
#[must_use]
pub fn task_status<R: Clone + Send + 'static>(task: &ScheduledTask<R>) -> TaskStatusResponse {
    let summary = task.summary();
    TaskStatusResponse {
        task_id: summary.id,
        state: summary.state,
        last_status: summary.last_status,
        next_run: summary.next_run,
        reason: summary.broken_cause,
    }
}

/// Status of a registered task.
///
/// # Errors
///
/// `TaskNotFound` if the task is not (or no longer) registered.
pub fn task_status_by_id<R: Clone + Send + 'static>(
    scheduler: &Scheduler<R>,
    id: &TaskId,
) -> Result<TaskStatusResponse, SchedulerError> {
    scheduler.get_task_by_id(id).map(|task| task_status(&task))
}

/// Registered tasks grouped per type, types sorted by name.
#[must_use]
pub fn list_tasks<R: Clone + Send + 'static>(scheduler: &Scheduler<R>) -> Vec<TaskTypeListing> {
    let mut listings: Vec<TaskTypeListing> = scheduler
        .get_all_tasks()
        .into_iter()
        .map(|(task_type, tasks)| {
            let tasks: Vec<TaskSummary> = tasks.iter().map(ScheduledTask::summary).collect();
            TaskTypeListing {
                executing: tasks.iter().filter(|t| t.state.is_executing()).count(),
                sleeping: tasks
                    .iter()
                    .filter(|t| t.state == TaskState::Sleeping)
                    .count(),
                task_type,
                tasks,
            }
        })
        .collect();
    listings.sort_by(|a, b| a.task_type.cmp(&b.task_type));
    listings
}

/// Return a health payload.
#[must_use]
pub fn health<R: Clone + Send + 'static>(scheduler: &Scheduler<R>) -> Health {
    Health {
        ok: !scheduler.is_shutdown(),
        registered_tasks: scheduler.task_count(),
        active_tasks: scheduler.get_active_tasks().len(),
        pool: scheduler.stats(),
    }
}
