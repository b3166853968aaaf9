//! The scheduler: task registration, the timer loop, dispatch to the worker
//! pool and completion handling.
//!
//! One timer thread sleeps on a condition variable until the earliest
//! pending trigger (or the poll interval) and fires every due task. Triggers
//! pass admission control first; refused triggers park in a per-type FIFO
//! and are promoted when an execution of that type completes.
//!
//! Lock order is always registry, then task. Callbacks into the task config
//! manager run after the registry lock is released.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::{Condvar, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink, TracingAuditSink};
use crate::core::registry::TaskRegistry;
use crate::core::task::TaskInner;
use crate::core::task_config::{NoopTaskConfigManager, TaskConfigManager};
use crate::core::worker_pool::{Job, PoolError, PoolStats, WorkerPool};
use crate::core::{
    LoggingProgressListener, ProgressListenerFactory, Schedule, ScheduledTask, SchedulerError,
    SchedulerTask, TaskContext, TaskInterrupted, TaskState, TaskSummary,
};
use crate::util::clock;
use crate::util::serde::TaskId;

/// Shortest timer wait, so a trigger the pool refused is retried without spinning.
const MIN_TIMER_WAIT: Duration = Duration::from_millis(5);

/// Condvar-protected timer state: `dirty` means the registry changed since
/// the last pass.
#[derive(Debug, Default)]
pub(crate) struct WakeState {
    dirty: bool,
    shutdown: bool,
}

enum RunOutcome<R> {
    Completed(R),
    Failed(anyhow::Error),
    Interrupted,
}

/// State shared by the scheduler handle, the timer thread, worker jobs and
/// task handles.
pub(crate) struct Shared<R: 'static> {
    registry: Mutex<TaskRegistry<R>>,
    pool: WorkerPool,
    wake: Mutex<WakeState>,
    wake_cv: Condvar,
    closed: AtomicBool,
    audit: Arc<dyn AuditSink>,
    config_manager: Arc<dyn TaskConfigManager<R>>,
    listener_factory: ProgressListenerFactory,
    max_results: Option<usize>,
    poll_interval: Duration,
}

/// In-process task scheduler producing results of type `R`.
///
/// Dropping the scheduler stops the timer loop and the worker pool without
/// waiting for running bodies; call [`Scheduler::shutdown`] for an orderly stop.
pub struct Scheduler<R: 'static> {
    shared: Arc<Shared<R>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Clone + Send + 'static> Scheduler<R> {
    /// Scheduler with no persistence, audit to `tracing` and logging progress listeners.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if validation fails; `Pool` if threads cannot be spawned.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        Self::from_parts(
            config,
            Arc::new(NoopTaskConfigManager),
            Arc::new(TracingAuditSink),
            LoggingProgressListener::factory(),
        )
    }

    /// Assemble a scheduler from its collaborators. Does not load persisted tasks.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if validation fails; `Pool` if threads cannot be spawned.
    pub fn from_parts(
        config: SchedulerConfig,
        config_manager: Arc<dyn TaskConfigManager<R>>,
        audit: Arc<dyn AuditSink>,
        listener_factory: ProgressListenerFactory,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        let pool = WorkerPool::new(config.pool.clone())?;
        let shared = Arc::new(Shared {
            registry: Mutex::new(TaskRegistry::default()),
            pool,
            wake: Mutex::new(WakeState::default()),
            wake_cv: Condvar::new(),
            closed: AtomicBool::new(false),
            audit,
            config_manager,
            listener_factory,
            max_results: config.max_results_per_task,
            poll_interval: config.poll_interval(),
        });

        let timer_shared = Arc::clone(&shared);
        let timer = thread::Builder::new()
            .name("sched-timer".into())
            .spawn(move || timer_loop(&timer_shared))
            .map_err(|e| PoolError::Internal(format!("failed to spawn timer thread: {e}")))?;

        info!(
            worker_count = config.pool.worker_count,
            poll_interval_ms = config.poll_interval_ms,
            "Scheduler started"
        );

        Ok(Self {
            shared,
            timer: Mutex::new(Some(timer)),
        })
    }

    /// Register a one-shot task that runs immediately. `task_type` is used as
    /// both name and admission key.
    ///
    /// # Errors
    ///
    /// `SubmissionRejected` if the work's policy refuses a second task of the
    /// type; `Shutdown` after shutdown.
    pub fn submit(
        &self,
        task_type: &str,
        work: Arc<dyn SchedulerTask<R>>,
    ) -> Result<ScheduledTask<R>, SchedulerError> {
        self.shared.register(
            TaskId::generate(),
            task_type.to_owned(),
            task_type.to_owned(),
            work,
            Schedule::RunNow,
            true,
            true,
        )
    }

    /// Register a task under `schedule`. The admission key comes from
    /// [`SchedulerTask::task_type`].
    ///
    /// # Errors
    ///
    /// `InvalidSchedule`, `SubmissionRejected` or `Shutdown`.
    pub fn schedule(
        &self,
        name: &str,
        work: Arc<dyn SchedulerTask<R>>,
        schedule: Schedule,
    ) -> Result<ScheduledTask<R>, SchedulerError> {
        let task_type = work.task_type();
        self.shared.register(
            TaskId::generate(),
            name.to_owned(),
            task_type,
            work,
            schedule,
            true,
            true,
        )
    }

    /// Restore a task with a known id. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// `DuplicateTask` if the id is registered, otherwise as [`Scheduler::schedule`].
    pub fn initialize(
        &self,
        id: TaskId,
        name: &str,
        task_type: &str,
        work: Arc<dyn SchedulerTask<R>>,
        schedule: Schedule,
        enabled: bool,
    ) -> Result<ScheduledTask<R>, SchedulerError> {
        self.shared.register(
            id,
            name.to_owned(),
            task_type.to_owned(),
            work,
            schedule,
            enabled,
            false,
        )
    }

    /// Tasks that are running, cancelling or waiting for admission.
    #[must_use]
    pub fn get_active_tasks(&self) -> Vec<ScheduledTask<R>> {
        let registry = self.shared.registry.lock();
        registry
            .all()
            .filter(|t| t.state().is_active())
            .cloned()
            .collect()
    }

    /// Every registered task, grouped by type.
    #[must_use]
    pub fn get_all_tasks(&self) -> HashMap<String, Vec<ScheduledTask<R>>> {
        self.shared.registry.lock().by_type().clone()
    }

    /// Registered tasks of one type, in registration order.
    #[must_use]
    pub fn get_tasks_of_type(&self, task_type: &str) -> Vec<ScheduledTask<R>> {
        self.shared
            .registry
            .lock()
            .by_type()
            .get(task_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Look up a registered task.
    ///
    /// # Errors
    ///
    /// `TaskNotFound` if no such task is registered; ended tasks are pruned
    /// and no longer found.
    pub fn get_task_by_id(&self, id: &TaskId) -> Result<ScheduledTask<R>, SchedulerError> {
        self.shared
            .registry
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| SchedulerError::TaskNotFound(id.clone()))
    }

    /// Summaries of every registered task.
    #[must_use]
    pub fn summaries(&self) -> Vec<TaskSummary> {
        let registry = self.shared.registry.lock();
        registry.all().map(ScheduledTask::summary).collect()
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.shared.registry.lock().len()
    }

    /// Number of triggers of `task_type` waiting for admission.
    #[must_use]
    pub fn sleeping_count(&self, task_type: &str) -> usize {
        self.shared.registry.lock().sleeping_len(task_type)
    }

    /// Worker pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.shared.pool.stats()
    }

    /// `true` once shutdown has started.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Stop the timer loop, interrupt running bodies and shut the worker pool down.
    ///
    /// Tasks interrupted by shutdown are not reported to the task config manager.
    pub fn shutdown(&self) {
        self.shared.close();
        if let Some(timer) = self.timer.lock().take() {
            if timer.join().is_err() {
                warn!("Timer thread panicked");
            }
        }
        self.shared.pool.shutdown();
        info!("Scheduler shut down");
    }
}

impl<R: 'static> Drop for Scheduler<R> {
    fn drop(&mut self) {
        if !self.shared.closed.load(Ordering::Acquire) {
            self.shared.close();
            debug!("Scheduler dropped without explicit shutdown - workers will be detached");
        }
    }
}

fn timer_loop<R: Clone + Send + 'static>(shared: &Arc<Shared<R>>) {
    debug!("Timer thread started");
    loop {
        let earliest = shared.tick(clock::now());
        let timeout = earliest.map_or(shared.poll_interval, |at| {
            clock::duration_until(clock::now(), at)
                .min(shared.poll_interval)
                .max(MIN_TIMER_WAIT)
        });

        let mut wake = shared.wake.lock();
        if wake.shutdown {
            break;
        }
        if !wake.dirty {
            shared.wake_cv.wait_for(&mut wake, timeout);
        }
        if wake.shutdown {
            break;
        }
        wake.dirty = false;
    }
    debug!("Timer thread exiting");
}

impl<R: 'static> Shared<R> {
    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        {
            let mut wake = self.wake.lock();
            wake.shutdown = true;
            self.wake_cv.notify_all();
        }
        let registry = self.registry.lock();
        for task in registry.all() {
            task.lock().signal_cancel(true);
        }
    }

    fn wake(&self) {
        let mut wake = self.wake.lock();
        wake.dirty = true;
        self.wake_cv.notify_one();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<R: Clone + Send + 'static> Shared<R> {
    fn audit(&self, task: &ScheduledTask<R>, action: AuditAction, detail: Option<String>) {
        self.audit
            .record(build_audit_event(task.id(), task.task_type(), action, detail));
    }

    #[allow(clippy::too_many_arguments)]
    fn register(
        self: &Arc<Self>,
        id: TaskId,
        name: String,
        task_type: String,
        work: Arc<dyn SchedulerTask<R>>,
        schedule: Schedule,
        enabled: bool,
        persist: bool,
    ) -> Result<ScheduledTask<R>, SchedulerError> {
        if self.is_closed() {
            return Err(SchedulerError::Shutdown);
        }
        schedule.validate()?;

        let now = clock::now();
        let task = ScheduledTask::new(
            id,
            name,
            task_type,
            work,
            schedule,
            enabled,
            now,
            Arc::downgrade(self),
        );
        {
            let mut registry = self.registry.lock();
            if registry.contains(task.id()) {
                return Err(SchedulerError::DuplicateTask(task.id().clone()));
            }
            if !registry.admits_submission(&task) {
                return Err(SchedulerError::SubmissionRejected {
                    task_type: task.task_type().to_owned(),
                });
            }
            registry.insert(task.clone());
        }

        info!(
            task_id = %task.id(),
            task_type = %task.task_type(),
            schedule = task.schedule().kind(),
            "Task registered"
        );
        self.audit(&task, AuditAction::Submitted, None);
        if persist {
            self.config_manager.add_task(&task);
        }

        {
            let mut registry = self.registry.lock();
            if registry.contains(task.id()) {
                self.fire_if_due(&mut registry, &task, clock::now());
            }
        }
        self.wake();
        Ok(task)
    }

    /// One timer pass. Returns the earliest pending trigger of an idle task.
    fn tick(self: &Arc<Self>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut registry = self.registry.lock();

        for task_type in registry.sleeping_types() {
            self.promote(&mut registry, &task_type);
        }

        let tasks: Vec<ScheduledTask<R>> = registry.all().cloned().collect();
        for task in &tasks {
            self.fire_if_due(&mut registry, task, now);
        }

        registry
            .all()
            .filter_map(|task| {
                let inner = task.lock();
                inner.state.is_runnable().then_some(inner.next_run).flatten()
            })
            .min()
    }

    /// Consume a due occurrence and trigger the task; disabled tasks only consume.
    ///
    /// An occurrence the pool refuses is put back, so the next pass retries it.
    fn fire_if_due(
        self: &Arc<Self>,
        registry: &mut TaskRegistry<R>,
        task: &ScheduledTask<R>,
        now: DateTime<Utc>,
    ) {
        let (enabled, pending) = {
            let mut inner = task.lock();
            let due = inner.state.is_runnable() && inner.next_run.is_some_and(|at| at <= now);
            if !due {
                return;
            }
            let pending = (inner.iterator.clone(), inner.next_run);
            inner.iterator.commit(now);
            inner.next_run = inner.iterator.peek();
            (inner.enabled, pending)
        };

        if !enabled {
            debug!(task_id = %task.id(), "Skipping trigger of disabled task");
            self.audit(task, AuditAction::Skipped, None);
            return;
        }
        if let Err(e) = self.trigger(registry, task, false) {
            let mut inner = task.lock();
            if inner.state.is_runnable() {
                let (iterator, next_run) = pending;
                inner.iterator = iterator;
                inner.next_run = next_run;
            }
            drop(inner);
            warn!(task_id = %task.id(), error = %e, "Failed to dispatch due task, retrying on next pass");
        }
    }

    /// Start the task or park it in its type's sleeping queue. A type with
    /// sleepers queues every new trigger behind them.
    fn trigger(
        self: &Arc<Self>,
        registry: &mut TaskRegistry<R>,
        task: &ScheduledTask<R>,
        manual: bool,
    ) -> Result<(), SchedulerError> {
        let admitted =
            registry.sleeping_len(task.task_type()) == 0 && registry.admits_execution(task);
        let mut inner = task.lock();
        if admitted {
            self.start(task, &mut inner, manual)?;
            drop(inner);
            self.audit(task, AuditAction::Started, manual.then(|| "manual".to_owned()));
            return Ok(());
        }

        if !inner.set_state(TaskState::Sleeping) {
            return Ok(());
        }
        inner.manual_run = manual;
        drop(inner);
        registry.enqueue_sleeping(task.task_type(), task.id().clone());
        debug!(task_id = %task.id(), task_type = %task.task_type(), "Task sleeping until its type is free");
        self.audit(task, AuditAction::Sleeping, None);
        Ok(())
    }

    /// Admit sleeping tasks of `task_type` in FIFO order until one is refused.
    fn promote(self: &Arc<Self>, registry: &mut TaskRegistry<R>, task_type: &str) {
        while let Some(id) = registry.sleeping_head(task_type).cloned() {
            let Some(task) = registry.get(&id).cloned() else {
                registry.pop_sleeping(task_type);
                continue;
            };
            if !registry.admits_execution(&task) {
                break;
            }
            registry.pop_sleeping(task_type);

            let mut inner = task.lock();
            if inner.state != TaskState::Sleeping {
                continue;
            }
            let manual = inner.manual_run;
            if let Err(e) = self.start(&task, &mut inner, manual) {
                drop(inner);
                warn!(task_id = %id, error = %e, "Failed to dispatch promoted task");
                registry.requeue_sleeping_front(task_type, id);
                break;
            }
            drop(inner);
            debug!(task_id = %id, task_type, "Sleeping task promoted");
            self.audit(&task, AuditAction::Promoted, None);
        }
    }

    /// Move the task to `Running` and hand its body to the worker pool.
    fn start(
        self: &Arc<Self>,
        task: &ScheduledTask<R>,
        inner: &mut TaskInner<R>,
        manual: bool,
    ) -> Result<(), SchedulerError> {
        let previous = inner.state;
        if !inner.set_state(TaskState::Running) {
            return Err(SchedulerError::IllegalTransition {
                task: task.id().clone(),
                from: previous,
                operation: "start",
            });
        }

        let cancel = CancellationToken::new();
        let interrupt = CancellationToken::new();
        inner.cancel = Some(cancel.clone());
        inner.interrupt = Some(interrupt.clone());
        inner.manual_run = manual;
        inner.to_be_removed = false;
        inner.run_started = Some(Instant::now());
        let previous_last_run = inner.last_run.replace(clock::now());

        let listener = (self.listener_factory)(task.id(), &inner.name);
        let ctx = TaskContext::new(task.id().clone(), inner.name.clone(), cancel, listener);
        let job = self.build_job(task.clone(), ctx, interrupt);

        if let Err(e) = self.pool.execute(job) {
            // Roll back; the body never ran.
            inner.state = previous;
            inner.cancel = None;
            inner.interrupt = None;
            inner.run_started = None;
            inner.last_run = previous_last_run;
            return Err(e.into());
        }
        debug!(task_id = %task.id(), task_type = %task.task_type(), manual, "Task dispatched");
        Ok(())
    }

    fn build_job(
        self: &Arc<Self>,
        task: ScheduledTask<R>,
        ctx: TaskContext,
        interrupt: CancellationToken,
    ) -> Job {
        let shared = Arc::downgrade(self);
        let work = task.work();
        Box::new(move || {
            Box::pin(async move {
                let outcome = tokio::select! {
                    biased;
                    () = interrupt.cancelled() => RunOutcome::Interrupted,
                    result = AssertUnwindSafe(work.call(ctx)).catch_unwind() => match result {
                        Ok(Ok(value)) => RunOutcome::Completed(value),
                        Ok(Err(e)) => RunOutcome::Failed(e),
                        Err(panic) => RunOutcome::Failed(anyhow::anyhow!(
                            "task panicked: {}",
                            panic_message(panic.as_ref())
                        )),
                    },
                };
                match shared.upgrade() {
                    Some(shared) => shared.complete(&task, outcome),
                    None => debug!(task_id = %task.id(), "Scheduler gone before task completed"),
                }
            })
        })
    }

    /// Record the outcome of a run and settle the task's next state.
    fn complete(self: &Arc<Self>, task: &ScheduledTask<R>, outcome: RunOutcome<R>) {
        let mut registry = self.registry.lock();
        let mut inner = task.lock();

        let was_cancelling = inner.state == TaskState::Cancelling;
        inner.last_duration = inner.run_started.take().map(|started| started.elapsed());
        inner.cancel = None;
        inner.interrupt = None;
        inner.manual_run = false;
        inner.next_run = inner.iterator.peek();

        // A body that bailed out through `check_canceled` while cancelling
        // stopped cooperatively; it did not fail.
        let outcome = match outcome {
            RunOutcome::Failed(e) if was_cancelling && e.is::<TaskInterrupted>() => None,
            other => Some(other),
        };

        let (next, prune, action) = match outcome {
            Some(RunOutcome::Failed(e)) => {
                warn!(task_id = %task.id(), task_type = %task.task_type(), error = %format!("{e:#}"), "Task execution failed");
                inner.broken_cause = Some(Arc::new(e));
                inner.last_status = Some(TaskState::Broken);
                let exhausted = !inner.iterator.schedule().is_manual()
                    && inner.next_run.is_none()
                    && inner.enabled;
                if inner.to_be_removed {
                    (TaskState::Cancelled, true, AuditAction::Cancelled)
                } else {
                    (TaskState::Broken, exhausted, AuditAction::Broken)
                }
            }
            Some(RunOutcome::Interrupted) => {
                inner.last_status = Some(TaskState::Cancelled);
                (TaskState::Cancelled, true, AuditAction::Cancelled)
            }
            completed => {
                if let Some(RunOutcome::Completed(value)) = completed {
                    if !was_cancelling {
                        inner.push_result(value, self.max_results);
                    }
                }
                inner.last_status = Some(if was_cancelling {
                    TaskState::Cancelled
                } else {
                    TaskState::Finished
                });
                let next = if inner.to_be_removed {
                    TaskState::Cancelled
                } else if inner.iterator.schedule().is_manual() {
                    TaskState::Submitted
                } else if inner.next_run.is_some() || !inner.enabled {
                    TaskState::Waiting
                } else if was_cancelling {
                    TaskState::Cancelled
                } else {
                    TaskState::Finished
                };
                let action = if next == TaskState::Cancelled {
                    AuditAction::Cancelled
                } else {
                    AuditAction::Completed
                };
                (next, next.is_ending(), action)
            }
        };

        inner.set_state(next);
        inner.to_be_removed = false;
        let duration_ms = inner
            .last_duration
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        drop(inner);

        let removed = prune && registry.remove(task.id()).is_some();
        self.promote(&mut registry, task.task_type());
        drop(registry);

        info!(
            task_id = %task.id(),
            task_type = %task.task_type(),
            state = %next,
            duration_ms,
            "Task run completed"
        );
        self.audit(task, action, None);
        if !self.is_closed() {
            if removed {
                self.config_manager.remove_task(task);
            } else {
                self.config_manager.add_task(task);
            }
        }
        if removed {
            self.audit(task, AuditAction::Removed, None);
        }
        self.wake();
    }

    /// Shared body of `cancel` and `cancel_only`.
    pub(crate) fn cancel(
        self: &Arc<Self>,
        task: &ScheduledTask<R>,
        interrupt: bool,
        only: bool,
    ) -> Result<(), SchedulerError> {
        let mut removed = false;
        {
            let mut registry = self.registry.lock();
            let mut inner = task.lock();
            let state = inner.state;
            if state.is_ending() || !registry.contains(task.id()) {
                return Ok(());
            }
            if only && matches!(state, TaskState::Waiting | TaskState::Broken) {
                return Ok(());
            }

            let mut remove = !only || inner.iterator.is_finished();
            if state.is_executing() {
                inner.set_state(TaskState::Cancelling);
                inner.signal_cancel(interrupt && !only);
                inner.to_be_removed |= remove;
                drop(inner);
                info!(task_id = %task.id(), interrupt, "Cancelling running task");
                self.audit(task, AuditAction::Cancelling, None);
            } else {
                if state == TaskState::Sleeping {
                    registry.dequeue_sleeping(task.task_type(), task.id());
                    inner.last_run = Some(clock::now());
                    remove = inner.iterator.is_finished();
                    if !remove {
                        let reverted = if inner.iterator.schedule().is_manual() {
                            TaskState::Submitted
                        } else {
                            TaskState::Waiting
                        };
                        inner.next_run = inner.iterator.peek();
                        inner.manual_run = false;
                        inner.set_state(reverted);
                    }
                }
                if remove {
                    inner.set_state(TaskState::Cancelled);
                    drop(inner);
                    registry.remove(task.id());
                    removed = true;
                }
            }
        }

        if removed {
            info!(task_id = %task.id(), "Task cancelled");
            self.audit(task, AuditAction::Cancelled, None);
            self.audit(task, AuditAction::Removed, None);
            self.config_manager.remove_task(task);
        }
        self.wake();
        Ok(())
    }

    pub(crate) fn run_now(self: &Arc<Self>, task: &ScheduledTask<R>) -> Result<(), SchedulerError> {
        if self.is_closed() {
            return Err(SchedulerError::Shutdown);
        }
        let mut registry = self.registry.lock();
        let state = task.state();
        let illegal = || SchedulerError::IllegalTransition {
            task: task.id().clone(),
            from: state,
            operation: "run_now",
        };
        if !registry.contains(task.id()) {
            return Err(illegal());
        }
        match state {
            TaskState::Sleeping => Ok(()),
            s if s.is_runnable() => self.trigger(&mut registry, task, true),
            _ => Err(illegal()),
        }
    }

    pub(crate) fn set_schedule(
        self: &Arc<Self>,
        task: &ScheduledTask<R>,
        schedule: Schedule,
    ) -> Result<(), SchedulerError> {
        schedule.validate()?;
        {
            let registry = self.registry.lock();
            let mut inner = task.lock();
            if inner.state.is_ending() || !registry.contains(task.id()) {
                return Err(SchedulerError::IllegalTransition {
                    task: task.id().clone(),
                    from: inner.state,
                    operation: "set_schedule",
                });
            }
            let manual = schedule.is_manual();
            inner.iterator = schedule.iterator_at(clock::now());
            inner.next_run = inner.iterator.peek();
            if manual && inner.state.is_runnable() {
                inner.set_state(TaskState::Submitted);
            }
        }
        debug!(task_id = %task.id(), "Task rescheduled");
        self.config_manager.add_task(task);
        self.wake();
        Ok(())
    }

    pub(crate) fn set_enabled(
        self: &Arc<Self>,
        task: &ScheduledTask<R>,
        enabled: bool,
    ) -> Result<(), SchedulerError> {
        {
            let registry = self.registry.lock();
            let mut inner = task.lock();
            if inner.state.is_ending() || !registry.contains(task.id()) {
                return Err(SchedulerError::IllegalTransition {
                    task: task.id().clone(),
                    from: inner.state,
                    operation: "set_enabled",
                });
            }
            inner.enabled = enabled;
        }
        debug!(task_id = %task.id(), enabled, "Task enabled flag changed");
        self.config_manager.add_task(task);
        self.wake();
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
