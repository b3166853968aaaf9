//! Persistence seam for task definitions.

use crate::core::{AppResult, ScheduledTask, Scheduler};

/// Stores task definitions so they survive restarts.
///
/// The scheduler calls `add_task` after registering, rescheduling, toggling
/// or running a task and `remove_task` after pruning one. Both run outside the
/// scheduler's locks and must not fail the scheduler operation; adapters log
/// their own failures.
pub trait TaskConfigManager<R: 'static>: Send + Sync {
    /// Re-register every stored task through [`Scheduler::initialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if stored definitions cannot be read.
    fn initialize_tasks(&self, scheduler: &Scheduler<R>) -> AppResult<()>;

    /// Store or replace the task's definition.
    fn add_task(&self, task: &ScheduledTask<R>);

    /// Forget the task's definition.
    fn remove_task(&self, task: &ScheduledTask<R>);
}

/// Manager that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTaskConfigManager;

impl<R: 'static> TaskConfigManager<R> for NoopTaskConfigManager {
    fn initialize_tasks(&self, _scheduler: &Scheduler<R>) -> AppResult<()> {
        Ok(())
    }

    fn add_task(&self, _task: &ScheduledTask<R>) {}

    fn remove_task(&self, _task: &ScheduledTask<R>) {}
}
