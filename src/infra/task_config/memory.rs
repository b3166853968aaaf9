//! In-memory task config manager.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::core::{
    AppResult, Schedule, ScheduledTask, Scheduler, SchedulerTask, TaskConfigManager,
    TaskParameters,
};
use crate::util::serde::TaskId;

use super::{TaskDefinition, TaskFactory};

/// Keeps task definitions in memory and restores them through registered
/// factories.
pub struct InMemoryTaskConfigManager<R> {
    definitions: RwLock<BTreeMap<TaskId, TaskDefinition>>,
    factories: RwLock<HashMap<String, TaskFactory<R>>>,
}

impl<R> Default for InMemoryTaskConfigManager<R> {
    fn default() -> Self {
        Self {
            definitions: RwLock::new(BTreeMap::new()),
            factories: RwLock::new(HashMap::new()),
        }
    }
}

impl<R: Clone + Send + 'static> InMemoryTaskConfigManager<R> {
    /// Empty store without factories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `task_type`, replacing any previous one.
    pub fn register_factory<F>(&self, task_type: impl Into<String>, factory: F)
    where
        F: Fn(&TaskParameters) -> AppResult<Arc<dyn SchedulerTask<R>>> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .insert(task_type.into(), Arc::new(factory));
    }

    /// Builder-style [`register_factory`](Self::register_factory).
    #[must_use]
    pub fn with_factory<F>(self, task_type: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&TaskParameters) -> AppResult<Arc<dyn SchedulerTask<R>>> + Send + Sync + 'static,
    {
        self.register_factory(task_type, factory);
        self
    }

    /// Store a definition directly, e.g. when seeding from another source.
    pub fn insert_definition(&self, definition: TaskDefinition) {
        self.definitions
            .write()
            .insert(definition.id.clone(), definition);
    }

    /// Stored definition for `id`.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<TaskDefinition> {
        self.definitions.read().get(id).cloned()
    }

    /// All stored definitions, ordered by id.
    #[must_use]
    pub fn definitions(&self) -> Vec<TaskDefinition> {
        self.definitions.read().values().cloned().collect()
    }

    /// Number of stored definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    /// `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }

    /// Record `task`; returns `false` when the task is not persistable.
    pub(crate) fn store(&self, task: &ScheduledTask<R>) -> bool {
        let mut definition = TaskDefinition::from_task(task);
        if definition.schedule == Schedule::RunNow {
            return false;
        }
        let mut definitions = self.definitions.write();
        if let Some(existing) = definitions.get(&definition.id) {
            definition.last_run = definition.last_run.or(existing.last_run);
        }
        debug!(task_id = %definition.id, task_type = %definition.task_type, "Storing task definition");
        definitions.insert(definition.id.clone(), definition);
        true
    }

    /// Forget `task`; returns `false` when nothing was stored.
    pub(crate) fn forget(&self, task: &ScheduledTask<R>) -> bool {
        self.definitions.write().remove(task.id()).is_some()
    }

    fn restore(&self, scheduler: &Scheduler<R>, definition: TaskDefinition) -> bool {
        let factory = self.factories.read().get(&definition.task_type).cloned();
        let Some(factory) = factory else {
            warn!(task_id = %definition.id, task_type = %definition.task_type, "No factory for stored task type, skipping");
            return false;
        };
        let work = match factory(&definition.parameters) {
            Ok(work) => work,
            Err(e) => {
                warn!(task_id = %definition.id, error = %e, "Failed to re-create stored task, skipping");
                return false;
            }
        };
        match scheduler.initialize(
            definition.id.clone(),
            &definition.name,
            &definition.task_type,
            work,
            definition.schedule,
            definition.enabled,
        ) {
            Ok(task) => {
                task.set_last_run(definition.last_run);
                true
            }
            Err(e) => {
                warn!(task_id = %definition.id, error = %e, "Failed to restore stored task, skipping");
                false
            }
        }
    }
}

impl<R: Clone + Send + 'static> TaskConfigManager<R> for InMemoryTaskConfigManager<R> {
    fn initialize_tasks(&self, scheduler: &Scheduler<R>) -> AppResult<()> {
        let definitions = self.definitions();
        let total = definitions.len();
        let mut restored = 0_usize;
        for definition in definitions {
            if self.restore(scheduler, definition) {
                restored += 1;
            }
        }
        info!(restored, total, "Restored stored tasks");
        Ok(())
    }

    fn add_task(&self, task: &ScheduledTask<R>) {
        self.store(task);
    }

    fn remove_task(&self, task: &ScheduledTask<R>) {
        self.forget(task);
    }
}
