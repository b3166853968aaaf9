//! Unit-of-work contract and admission-control policies.
//!
//! Anything the scheduler runs implements [`SchedulerTask`]. Work that must
//! not overlap with other tasks of its type also supplies a
//! [`ConcurrencyPolicy`].

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, TaskContext, TaskState, TaskSummary};

/// A runnable unit of work producing `R`.
///
/// The body receives a [`TaskContext`] for cancellation checks and progress
/// reporting. Errors returned here never reach the scheduler's timer loop;
/// they move the task to `Broken` and are kept as its failure cause.
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_task_scheduler::core::{AppResult, SchedulerTask, TaskContext};
///
/// struct Reindex;
///
/// #[async_trait]
/// impl SchedulerTask<u64> for Reindex {
///     async fn call(&self, ctx: TaskContext) -> AppResult<u64> {
///         ctx.begin_task("reindex", Some(100));
///         for _ in 0..100 {
///             ctx.check_canceled()?;
///             ctx.working(1);
///         }
///         Ok(100)
///     }
/// }
/// ```
#[async_trait]
pub trait SchedulerTask<R>: Send + Sync + 'static {
    /// Run the body once.
    async fn call(&self, ctx: TaskContext) -> AppResult<R>;

    /// Admission-control key. Defaults to the implementing type's name.
    fn task_type(&self) -> String {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Admission policy; `None` allows everything.
    fn concurrency_policy(&self) -> Option<&dyn ConcurrencyPolicy> {
        None
    }

    /// Parameters used to re-create this work after a restart.
    fn parameters(&self) -> Option<&TaskParameters> {
        None
    }
}

/// Predicates deciding whether a task may coexist with other tasks of its type.
///
/// Both receive the other registered tasks sharing the candidate's type.
pub trait ConcurrencyPolicy: Send + Sync {
    /// Checked at registration. Returning `false` while another task of the
    /// type is registered rejects the submission.
    fn allow_concurrent_submission(&self, _others: &ActiveTasks) -> bool {
        true
    }

    /// Checked at each trigger. Returning `false` while another task of the
    /// type is executing puts the trigger to sleep until that task completes.
    fn allow_concurrent_execution(&self, _others: &ActiveTasks) -> bool {
        true
    }
}

/// One execution of the type at a time; extra triggers queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExclusiveExecution;

impl ConcurrencyPolicy for ExclusiveExecution {
    fn allow_concurrent_execution(&self, _others: &ActiveTasks) -> bool {
        false
    }
}

/// At most one registered task of the type.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleInstance;

impl ConcurrencyPolicy for SingleInstance {
    fn allow_concurrent_submission(&self, _others: &ActiveTasks) -> bool {
        false
    }

    fn allow_concurrent_execution(&self, _others: &ActiveTasks) -> bool {
        false
    }
}

/// Snapshot of the other registered tasks sharing a task type.
#[derive(Debug, Clone, Default)]
pub struct ActiveTasks {
    task_type: String,
    tasks: Vec<TaskSummary>,
}

impl ActiveTasks {
    /// Build a view over `tasks`, all of type `task_type`.
    #[must_use]
    pub fn new(task_type: impl Into<String>, tasks: Vec<TaskSummary>) -> Self {
        Self {
            task_type: task_type.into(),
            tasks,
        }
    }

    /// Type shared by every task in the view.
    #[must_use]
    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    /// All tasks in the view.
    #[must_use]
    pub fn tasks(&self) -> &[TaskSummary] {
        &self.tasks
    }

    /// Number of tasks in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// `true` when no other task of the type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks currently in `state`.
    pub fn in_state(&self, state: TaskState) -> impl Iterator<Item = &TaskSummary> {
        self.tasks.iter().filter(move |t| t.state == state)
    }

    /// `true` when any task in the view is `Running` or `Cancelling`.
    #[must_use]
    pub fn any_executing(&self) -> bool {
        self.tasks.iter().any(|t| t.state.is_executing())
    }
}

/// Simple string key/value parameters carried by a unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskParameters(BTreeMap<String, String>);

impl TaskParameters {
    /// Empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn add_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get_parameter(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate over all parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `true` when no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

type BoxedBody<R> =
    Box<dyn Fn(TaskContext) -> futures::future::BoxFuture<'static, AppResult<R>> + Send + Sync>;

/// Closure-backed unit of work with an explicit type string.
pub struct FnTask<R> {
    task_type: String,
    body: BoxedBody<R>,
    policy: Option<Arc<dyn ConcurrencyPolicy>>,
    parameters: Option<TaskParameters>,
}

impl<R: Send + 'static> FnTask<R> {
    /// Wrap `body`; each run calls it with a fresh context.
    pub fn new<F, Fut>(task_type: impl Into<String>, body: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<R>> + Send + 'static,
    {
        Self {
            task_type: task_type.into(),
            body: Box::new(move |ctx| Box::pin(body(ctx))),
            policy: None,
            parameters: None,
        }
    }

    /// Attach an admission policy.
    #[must_use]
    pub fn with_policy(mut self, policy: impl ConcurrencyPolicy + 'static) -> Self {
        self.policy = Some(Arc::new(policy));
        self
    }

    /// Add one parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .get_or_insert_with(TaskParameters::new)
            .add_parameter(key, value);
        self
    }
}

#[async_trait]
impl<R: Send + 'static> SchedulerTask<R> for FnTask<R> {
    async fn call(&self, ctx: TaskContext) -> AppResult<R> {
        (self.body)(ctx).await
    }

    fn task_type(&self) -> String {
        self.task_type.clone()
    }

    fn concurrency_policy(&self) -> Option<&dyn ConcurrencyPolicy> {
        self.policy.as_deref()
    }

    fn parameters(&self) -> Option<&TaskParameters> {
        self.parameters.as_ref()
    }
}

/// Shorthand for [`FnTask::new`] returning a shareable handle.
pub fn task_fn<R, F, Fut>(task_type: impl Into<String>, body: F) -> Arc<FnTask<R>>
where
    R: Send + 'static,
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<R>> + Send + 'static,
{
    Arc::new(FnTask::new(task_type, body))
}

/// Strip module paths from a type name, keeping generic arguments intact.
fn short_type_name(full: &str) -> String {
    let (base, generics) = full.find('<').map_or((full, ""), |i| full.split_at(i));
    let base = base.rsplit("::").next().unwrap_or(base);
    format!("{base}{generics}")
}
