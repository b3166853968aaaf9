//! Task config manager adapters: an in-memory store and a JSON file store.

pub mod file;
pub mod memory;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, Schedule, ScheduledTask, SchedulerTask, TaskParameters};
use crate::util::serde::TaskId;

pub use file::JsonFileTaskConfigManager;
pub use memory::InMemoryTaskConfigManager;

/// Re-creates a unit of work of one type from its stored parameters.
pub type TaskFactory<R> =
    Arc<dyn Fn(&TaskParameters) -> AppResult<Arc<dyn SchedulerTask<R>>> + Send + Sync>;

/// Persisted form of a scheduled task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Task id, kept across restarts.
    pub id: TaskId,
    /// Display name.
    pub name: String,
    /// Type string used to pick the factory.
    pub task_type: String,
    /// Whether scheduled triggers run.
    pub enabled: bool,
    /// Schedule to restore.
    pub schedule: Schedule,
    /// Parameters handed to the factory.
    #[serde(default)]
    pub parameters: TaskParameters,
    /// Start of the latest run.
    pub last_run: Option<DateTime<Utc>>,
    /// Next trigger at the time of saving (informational).
    pub next_run: Option<DateTime<Utc>>,
}

impl TaskDefinition {
    /// Capture the current definition of `task`.
    #[must_use]
    pub fn from_task<R: 'static>(task: &ScheduledTask<R>) -> Self {
        let summary = task.summary();
        Self {
            id: summary.id,
            name: summary.name,
            task_type: summary.task_type,
            enabled: summary.enabled,
            schedule: summary.schedule,
            parameters: task.parameters().unwrap_or_default(),
            last_run: summary.last_run,
            next_run: summary.next_run,
        }
    }
}
