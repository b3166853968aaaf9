//! Builder assembling a [`Scheduler`] from configuration and collaborators.

use std::sync::Arc;

use tracing::info;

use crate::config::SchedulerConfig;
use crate::core::{
    AuditSink, LoggingProgressListener, NoopTaskConfigManager, ProgressListenerFactory, Scheduler,
    SchedulerError, TaskConfigManager, TracingAuditSink,
};

/// Builds a scheduler and restores persisted tasks into it.
pub struct SchedulerBuilder<R: 'static> {
    config: SchedulerConfig,
    config_manager: Arc<dyn TaskConfigManager<R>>,
    audit: Arc<dyn AuditSink>,
    listener_factory: ProgressListenerFactory,
}

impl<R: Clone + Send + 'static> SchedulerBuilder<R> {
    /// Builder with no persistence, `tracing` audit and logging progress listeners.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            config_manager: Arc::new(NoopTaskConfigManager),
            audit: Arc::new(TracingAuditSink),
            listener_factory: LoggingProgressListener::factory(),
        }
    }

    /// Persist and restore task definitions through `manager`.
    #[must_use]
    pub fn with_config_manager(mut self, manager: Arc<dyn TaskConfigManager<R>>) -> Self {
        self.config_manager = manager;
        self
    }

    /// Record lifecycle events into `audit`.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Install a custom progress listener per execution.
    #[must_use]
    pub fn with_progress_listener_factory(mut self, factory: ProgressListenerFactory) -> Self {
        self.listener_factory = factory;
        self
    }

    /// Start the scheduler and restore persisted tasks.
    ///
    /// # Errors
    ///
    /// Configuration and pool errors from [`Scheduler::from_parts`], or
    /// `Backend` if stored tasks cannot be loaded.
    pub fn build(self) -> Result<Scheduler<R>, SchedulerError> {
        let manager = Arc::clone(&self.config_manager);
        let scheduler = Scheduler::from_parts(
            self.config,
            self.config_manager,
            self.audit,
            self.listener_factory,
        )?;
        manager
            .initialize_tasks(&scheduler)
            .map_err(|e| SchedulerError::Backend(format!("loading stored tasks failed: {e:#}")))?;
        info!(tasks = scheduler.task_count(), "Scheduler ready");
        Ok(scheduler)
    }
}

impl<R: Clone + Send + 'static> Scheduler<R> {
    /// Start building a scheduler from `config`.
    #[must_use]
    pub fn builder(config: SchedulerConfig) -> SchedulerBuilder<R> {
        SchedulerBuilder::new(config)
    }
}
