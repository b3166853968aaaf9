//! Execution context handed to every task body.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::TaskInterrupted;
use crate::util::serde::TaskId;

/// Receives progress reports from a running body.
pub trait ProgressListener: Send + Sync {
    /// A (sub)task started; `total_units` is known when the body can size its work.
    fn begin_task(&self, name: &str, total_units: Option<u64>);
    /// `units` more units of work are done.
    fn working(&self, units: u64);
    /// The (sub)task ended.
    fn end_task(&self, message: &str);
}

/// Builds the listener installed for each execution.
pub type ProgressListenerFactory =
    Arc<dyn Fn(&TaskId, &str) -> Arc<dyn ProgressListener> + Send + Sync>;

/// Point-in-time view of reported progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Name passed to the latest `begin_task`.
    pub current: Option<String>,
    /// Total units announced, if any.
    pub total_units: Option<u64>,
    /// Units reported so far.
    pub worked_units: u64,
    /// Message of the latest `end_task`.
    pub message: Option<String>,
}

/// Default listener: reports through `tracing` and keeps a snapshot.
pub struct LoggingProgressListener {
    task_id: TaskId,
    scope: String,
    snapshot: Mutex<ProgressSnapshot>,
}

impl LoggingProgressListener {
    /// Listener for the task `task_id`, labelled `scope` in logs.
    #[must_use]
    pub fn new(task_id: TaskId, scope: impl Into<String>) -> Self {
        Self {
            task_id,
            scope: scope.into(),
            snapshot: Mutex::new(ProgressSnapshot::default()),
        }
    }

    /// Factory installing a `LoggingProgressListener` per execution.
    #[must_use]
    pub fn factory() -> ProgressListenerFactory {
        Arc::new(|id: &TaskId, name: &str| {
            Arc::new(Self::new(id.clone(), name)) as Arc<dyn ProgressListener>
        })
    }

    /// Copy of the progress reported so far.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot.lock().clone()
    }
}

impl ProgressListener for LoggingProgressListener {
    fn begin_task(&self, name: &str, total_units: Option<u64>) {
        {
            let mut snapshot = self.snapshot.lock();
            snapshot.current = Some(name.to_owned());
            snapshot.total_units = total_units;
            snapshot.worked_units = 0;
            snapshot.message = None;
        }
        info!(task_id = %self.task_id, scope = %self.scope, step = name, total_units, "Task progress started");
    }

    fn working(&self, units: u64) {
        let (worked, total) = {
            let mut snapshot = self.snapshot.lock();
            snapshot.worked_units = snapshot.worked_units.saturating_add(units);
            (snapshot.worked_units, snapshot.total_units)
        };
        debug!(task_id = %self.task_id, scope = %self.scope, worked, total, "Task progress");
    }

    fn end_task(&self, message: &str) {
        self.snapshot.lock().message = Some(message.to_owned());
        info!(task_id = %self.task_id, scope = %self.scope, detail = message, "Task progress ended");
    }
}

/// Per-execution handle for cancellation checks and progress reporting.
///
/// Clones share the same cancellation state.
#[derive(Clone)]
pub struct TaskContext {
    task_id: TaskId,
    name: String,
    cancel: CancellationToken,
    listener: Arc<dyn ProgressListener>,
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("task_id", &self.task_id)
            .field("name", &self.name)
            .field("canceled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl TaskContext {
    /// Context wired to an existing cancellation token and listener.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        name: impl Into<String>,
        cancel: CancellationToken,
        listener: Arc<dyn ProgressListener>,
    ) -> Self {
        Self {
            task_id,
            name: name.into(),
            cancel,
            listener,
        }
    }

    /// Standalone context, for running a body outside a scheduler.
    #[must_use]
    pub fn detached(name: impl Into<String>) -> Self {
        let name = name.into();
        let task_id = TaskId::generate();
        let listener = Arc::new(LoggingProgressListener::new(task_id.clone(), name.clone()));
        Self::new(task_id, name, CancellationToken::new(), listener)
    }

    /// Id of the task being executed.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Name of the task (or subtask) being executed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` once cancellation has been requested.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when cancellation is requested.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Fail with [`TaskInterrupted`] if cancellation has been requested.
    ///
    /// # Errors
    ///
    /// Returns `TaskInterrupted` once the task is cancelled.
    pub fn check_canceled(&self) -> Result<(), TaskInterrupted> {
        if self.is_canceled() {
            Err(TaskInterrupted {
                task: self.name.clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Token backing this context, for handing to other async code.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation of this context and its subtasks.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Report the start of a unit of work.
    pub fn begin_task(&self, name: &str, total_units: Option<u64>) {
        self.listener.begin_task(name, total_units);
    }

    /// Report progress.
    pub fn working(&self, units: u64) {
        self.listener.working(units);
    }

    /// Report the end of a unit of work.
    pub fn end_task(&self, message: &str) {
        self.listener.end_task(message);
    }

    /// Context for nested work: cancelled with this one, reporting under
    /// its own scope.
    #[must_use]
    pub fn subtask(&self, name: &str) -> Self {
        let scope = format!("{}/{name}", self.name);
        let listener = Arc::new(LoggingProgressListener::new(self.task_id.clone(), scope.clone()));
        Self::new(self.task_id.clone(), scope, self.cancel.child_token(), listener)
    }
}
