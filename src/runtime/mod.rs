//! Serializable query surface over a running scheduler.

pub mod api;

pub use api::{health, list_tasks, task_status, task_status_by_id, Health, TaskStatusResponse, TaskTypeListing};
