//! Builders that assemble runtime objects from configuration.

pub mod scheduler_builder;

pub use scheduler_builder::SchedulerBuilder;
