//! Scheduled task handles.
//!
//! A [`ScheduledTask`] is a cheap, cloneable handle to one registered task.
//! Its mutable state lives behind a per-task mutex; operations that change
//! scheduling (cancel, run now, reschedule) are routed through the owning
//! scheduler so the registry and admission queues stay consistent.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::scheduler::Shared;
use crate::core::{
    Schedule, ScheduleIterator, SchedulerError, SchedulerTask, TaskParameters, TaskState,
};
use crate::util::serde::TaskId;

/// Serializable point-in-time view of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Task id.
    pub id: TaskId,
    /// Display name.
    pub name: String,
    /// Admission-control key.
    pub task_type: String,
    /// Current state.
    pub state: TaskState,
    /// Whether scheduled triggers run.
    pub enabled: bool,
    /// Current schedule.
    pub schedule: Schedule,
    /// Registration time.
    pub scheduled_at: DateTime<Utc>,
    /// Start of the latest run.
    pub last_run: Option<DateTime<Utc>>,
    /// Next scheduled trigger.
    pub next_run: Option<DateTime<Utc>>,
    /// Outcome of the latest run.
    pub last_status: Option<TaskState>,
    /// Duration of the latest run, in milliseconds.
    pub last_duration_ms: Option<u64>,
    /// Number of results kept.
    pub result_count: usize,
    /// Message of the latest failure.
    pub broken_cause: Option<String>,
}

/// Mutable task fields, guarded by the task's mutex.
pub(crate) struct TaskInner<R> {
    pub name: String,
    pub state: TaskState,
    pub enabled: bool,
    pub iterator: ScheduleIterator,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub last_status: Option<TaskState>,
    pub last_duration: Option<Duration>,
    pub results: VecDeque<R>,
    pub broken_cause: Option<Arc<anyhow::Error>>,
    /// Set by cancellation of an executing run; the run ends in `Cancelled`.
    pub to_be_removed: bool,
    /// Current run was started through `run_now`.
    pub manual_run: bool,
    pub run_started: Option<Instant>,
    pub cancel: Option<CancellationToken>,
    pub interrupt: Option<CancellationToken>,
}

impl<R> TaskInner<R> {
    /// Move to `next` if the state machine allows it.
    pub fn set_state(&mut self, next: TaskState) -> bool {
        if self.state == next || self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            warn!(from = %self.state, to = %next, task = %self.name, "Refusing illegal task state transition");
            false
        }
    }

    pub fn push_result(&mut self, value: R, cap: Option<usize>) {
        self.results.push_back(value);
        if let Some(cap) = cap {
            while self.results.len() > cap {
                self.results.pop_front();
            }
        }
    }

    /// Request the current run to stop. Interruption also drops the body.
    pub fn signal_cancel(&self, interrupt: bool) {
        if let Some(token) = &self.cancel {
            token.cancel();
        }
        if interrupt {
            if let Some(token) = &self.interrupt {
                token.cancel();
            }
        }
    }
}

pub(crate) struct TaskCore<R: 'static> {
    pub id: TaskId,
    pub task_type: String,
    pub scheduled_at: DateTime<Utc>,
    pub work: Arc<dyn SchedulerTask<R>>,
    pub inner: Mutex<TaskInner<R>>,
    pub scheduler: Weak<Shared<R>>,
}

/// Handle to a registered task.
pub struct ScheduledTask<R: 'static> {
    pub(crate) core: Arc<TaskCore<R>>,
}

impl<R: 'static> Clone for ScheduledTask<R> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<R: 'static> fmt::Debug for ScheduledTask<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.core.inner.lock();
        f.debug_struct("ScheduledTask")
            .field("id", &self.core.id)
            .field("name", &inner.name)
            .field("task_type", &self.core.task_type)
            .field("state", &inner.state)
            .finish_non_exhaustive()
    }
}

impl<R: 'static> ScheduledTask<R> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: TaskId,
        name: String,
        task_type: String,
        work: Arc<dyn SchedulerTask<R>>,
        schedule: Schedule,
        enabled: bool,
        now: DateTime<Utc>,
        scheduler: Weak<Shared<R>>,
    ) -> Self {
        let iterator = ScheduleIterator::new(schedule, now);
        let next_run = iterator.peek();
        let inner = TaskInner {
            name,
            state: TaskState::Submitted,
            enabled,
            iterator,
            next_run,
            last_run: None,
            last_status: None,
            last_duration: None,
            results: VecDeque::new(),
            broken_cause: None,
            to_be_removed: false,
            manual_run: false,
            run_started: None,
            cancel: None,
            interrupt: None,
        };
        Self {
            core: Arc::new(TaskCore {
                id,
                task_type,
                scheduled_at: now,
                work,
                inner: Mutex::new(inner),
                scheduler,
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, TaskInner<R>> {
        self.core.inner.lock()
    }

    /// Task id.
    #[must_use]
    pub fn id(&self) -> &TaskId {
        &self.core.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    /// Rename the task.
    pub fn set_name(&self, name: impl Into<String>) {
        self.lock().name = name.into();
    }

    /// Admission-control key.
    #[must_use]
    pub fn task_type(&self) -> &str {
        &self.core.task_type
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.lock().state
    }

    /// Whether scheduled triggers run the task.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Current schedule.
    #[must_use]
    pub fn schedule(&self) -> Schedule {
        self.lock().iterator.schedule().clone()
    }

    /// When the task was registered.
    #[must_use]
    pub fn scheduled_at(&self) -> DateTime<Utc> {
        self.core.scheduled_at
    }

    /// Start of the latest run (or of the latest cancelled trigger).
    #[must_use]
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.lock().last_run
    }

    /// Overwrite the last-run time, e.g. when restoring a persisted task.
    pub fn set_last_run(&self, at: Option<DateTime<Utc>>) {
        self.lock().last_run = at;
    }

    /// Next scheduled trigger, if any.
    #[must_use]
    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        self.lock().next_run
    }

    /// Outcome of the latest run: `Finished`, `Broken` or `Cancelled`.
    #[must_use]
    pub fn last_status(&self) -> Option<TaskState> {
        self.lock().last_status
    }

    /// Wall-clock duration of the latest run.
    #[must_use]
    pub fn last_duration(&self) -> Option<Duration> {
        self.lock().last_duration
    }

    /// Failure of the latest failed run.
    #[must_use]
    pub fn broken_cause(&self) -> Option<Arc<anyhow::Error>> {
        self.lock().broken_cause.clone()
    }

    /// Parameters of the underlying work.
    #[must_use]
    pub fn parameters(&self) -> Option<TaskParameters> {
        self.core.work.parameters().cloned()
    }

    /// The underlying unit of work.
    #[must_use]
    pub fn work(&self) -> Arc<dyn SchedulerTask<R>> {
        Arc::clone(&self.core.work)
    }

    /// Point-in-time summary.
    #[must_use]
    pub fn summary(&self) -> TaskSummary {
        let inner = self.lock();
        TaskSummary {
            id: self.core.id.clone(),
            name: inner.name.clone(),
            task_type: self.core.task_type.clone(),
            state: inner.state,
            enabled: inner.enabled,
            schedule: inner.iterator.schedule().clone(),
            scheduled_at: self.core.scheduled_at,
            last_run: inner.last_run,
            next_run: inner.next_run,
            last_status: inner.last_status,
            last_duration_ms: inner
                .last_duration
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            result_count: inner.results.len(),
            broken_cause: inner.broken_cause.as_ref().map(|e| format!("{e:#}")),
        }
    }

    fn scheduler(&self) -> Result<Arc<Shared<R>>, SchedulerError> {
        self.core.scheduler.upgrade().ok_or(SchedulerError::Shutdown)
    }
}

impl<R: Clone + Send + 'static> ScheduledTask<R> {
    /// Results of successful runs, oldest first.
    #[must_use]
    pub fn get_results(&self) -> Vec<R> {
        self.lock().results.iter().cloned().collect()
    }

    /// Enable or disable scheduled triggers. Manual runs ignore the flag.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` if the task ended or is no longer registered;
    /// `Shutdown` if the scheduler is gone.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), SchedulerError> {
        self.scheduler()?.set_enabled(self, enabled)
    }

    /// Replace the schedule and recompute the next run.
    ///
    /// # Errors
    ///
    /// `InvalidSchedule` for a malformed schedule, `IllegalTransition` if the
    /// task ended or is no longer registered, `Shutdown` if the scheduler is gone.
    pub fn set_schedule(&self, schedule: Schedule) -> Result<(), SchedulerError> {
        self.scheduler()?.set_schedule(self, schedule)
    }

    /// Cancel the task, interrupting a running body when `interrupt` is set.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Shutdown` if the scheduler is gone.
    pub fn cancel(&self, interrupt: bool) -> Result<(), SchedulerError> {
        self.scheduler()?.cancel(self, interrupt, false)
    }

    /// Cooperatively stop the current or queued occurrence. Idle tasks are
    /// left alone; recurring tasks keep their schedule.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Shutdown` if the scheduler is gone.
    pub fn cancel_only(&self) -> Result<(), SchedulerError> {
        self.scheduler()?.cancel(self, false, true)
    }

    /// Trigger an immediate run, subject to admission control.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` if the task is executing, ended or no longer
    /// registered; `Shutdown` if the scheduler is gone.
    pub fn run_now(&self) -> Result<(), SchedulerError> {
        self.scheduler()?.run_now(self)
    }
}
