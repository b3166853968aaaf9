//! Core scheduling abstractions: schedules, task state, admission control,
//! the scheduler and its worker pool.

pub mod audit;
pub mod context;
pub mod error;
pub(crate) mod registry;
pub mod schedule;
pub mod schedule_iterator;
pub mod scheduler;
pub mod state;
pub mod task;
pub mod task_config;
pub mod work;
pub mod worker_pool;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
pub use context::{
    LoggingProgressListener, ProgressListener, ProgressListenerFactory, ProgressSnapshot,
    TaskContext,
};
pub use error::{AppResult, SchedulerError, TaskInterrupted};
pub use schedule::Schedule;
pub use schedule_iterator::{ScheduleIterator, MISFIRE_GRACE_SECS};
pub use scheduler::Scheduler;
pub use state::TaskState;
pub use task::{ScheduledTask, TaskSummary};
pub use task_config::{NoopTaskConfigManager, TaskConfigManager};
pub use work::{
    task_fn, ActiveTasks, ConcurrencyPolicy, ExclusiveExecution, FnTask, SchedulerTask,
    SingleInstance, TaskParameters,
};
pub use worker_pool::{Job, PoolError, PoolStats, WorkerPool};
