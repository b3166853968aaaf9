//! Infrastructure adapters for task definition storage.

pub mod task_config;

pub use task_config::{
    InMemoryTaskConfigManager, JsonFileTaskConfigManager, TaskDefinition, TaskFactory,
};
