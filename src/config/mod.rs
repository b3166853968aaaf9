//! Configuration models for the worker pool and scheduler.

pub mod pool;
pub mod scheduler;

pub use pool::WorkerPoolConfig;
pub use scheduler::SchedulerConfig;
