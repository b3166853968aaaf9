//! # Prometheus Task Scheduler
//!
//! An in-process task scheduler for long-running maintenance work.
//!
//! Tasks are units of work registered under a [`Schedule`](core::Schedule):
//! manual, run-now, once, hourly, daily, weekly, monthly or a fixed interval.
//! A single timer thread fires due tasks; bodies run on a pool of dedicated
//! worker threads, each with its own single-threaded tokio runtime, so a slow
//! task never stalls the timer or other task types.
//!
//! ## Key Features
//!
//! - **Task state machine**: every task moves through `SUBMITTED`, `RUNNING`,
//!   `WAITING`, `SLEEPING`, `CANCELLING` and ends `FINISHED` or `CANCELLED`,
//!   with failures parked in `BROKEN`
//! - **Admission control**: work may refuse to run next to other tasks of its
//!   type; refused triggers sleep in FIFO order until the type is free
//! - **Cancellation**: cooperative through [`TaskContext`](core::TaskContext),
//!   or forced by dropping the running body
//! - **Persistence seam**: a [`TaskConfigManager`](core::TaskConfigManager)
//!   stores task definitions; in-memory and JSON-file adapters are included
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use prometheus_task_scheduler::config::SchedulerConfig;
//! use prometheus_task_scheduler::core::{task_fn, Schedule, Scheduler};
//!
//! let scheduler: Scheduler<u64> = Scheduler::new(SchedulerConfig::default())?;
//!
//! // One-shot task, runs right away.
//! let task = scheduler.submit("reindex", task_fn("reindex", |ctx| async move {
//!     ctx.check_canceled()?;
//!     Ok(42)
//! }))?;
//!
//! // Recurring task every 30 seconds.
//! let now = chrono::Utc::now();
//! scheduler.schedule(
//!     "purge",
//!     task_fn("purge", |_ctx| async { Ok(0) }),
//!     Schedule::every(now, None, Duration::from_secs(30)),
//! )?;
//!
//! task.cancel(true)?;
//! scheduler.shutdown();
//! ```
//!
//! For complete examples, see:
//! - `tests/scheduler_test.rs` - lifecycle scenarios
//! - `tests/cancellation_test.rs` - cancellation matrix

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: schedules, task state, the scheduler.
pub mod core;
/// Configuration models for the worker pool and scheduler.
pub mod config;
/// Builders to construct a scheduler from configuration.
pub mod builders;
/// Infrastructure adapters for task definition storage.
pub mod infra;
/// Serializable query surface.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::builders::SchedulerBuilder;
pub use crate::config::{SchedulerConfig, WorkerPoolConfig};
pub use crate::core::{
    task_fn, Schedule, ScheduledTask, Scheduler, SchedulerError, SchedulerTask, TaskContext,
    TaskState,
};
pub use crate::util::TaskId;
