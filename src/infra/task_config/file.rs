//! JSON file task config manager.
//!
//! Definitions are kept in memory and rewritten to a single JSON file after
//! every change. The file is replaced atomically through a sibling temp file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::core::{AppResult, ScheduledTask, Scheduler, SchedulerTask, TaskConfigManager, TaskParameters};

use super::{InMemoryTaskConfigManager, TaskDefinition};

/// File-backed task config manager.
pub struct JsonFileTaskConfigManager<R> {
    path: PathBuf,
    store: InMemoryTaskConfigManager<R>,
    write_lock: Mutex<()>,
}

impl<R: Clone + Send + 'static> JsonFileTaskConfigManager<R> {
    /// Open the store at `path`, loading existing definitions if the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let store = InMemoryTaskConfigManager::new();
        if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading task definitions from {}", path.display()))?;
            let definitions: Vec<TaskDefinition> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing task definitions in {}", path.display()))?;
            debug!(path = %path.display(), count = definitions.len(), "Loaded task definitions");
            for definition in definitions {
                store.insert_definition(definition);
            }
        }
        Ok(Self {
            path,
            store,
            write_lock: Mutex::new(()),
        })
    }

    /// Register the factory for `task_type`.
    pub fn register_factory<F>(&self, task_type: impl Into<String>, factory: F)
    where
        F: Fn(&TaskParameters) -> AppResult<std::sync::Arc<dyn SchedulerTask<R>>>
            + Send
            + Sync
            + 'static,
    {
        self.store.register_factory(task_type, factory);
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored definitions, ordered by id.
    #[must_use]
    pub fn definitions(&self) -> Vec<TaskDefinition> {
        self.store.definitions()
    }

    /// Write all definitions to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> AppResult<()> {
        let _guard = self.write_lock.lock();
        let json = serde_json::to_string_pretty(&self.store.definitions())
            .context("serializing task definitions")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    fn save_logged(&self) {
        if let Err(e) = self.save() {
            warn!(path = %self.path.display(), error = %format!("{e:#}"), "Failed to save task definitions");
        }
    }
}

impl<R: Clone + Send + 'static> TaskConfigManager<R> for JsonFileTaskConfigManager<R> {
    fn initialize_tasks(&self, scheduler: &Scheduler<R>) -> AppResult<()> {
        self.store.initialize_tasks(scheduler)
    }

    fn add_task(&self, task: &ScheduledTask<R>) {
        if self.store.store(task) {
            self.save_logged();
        }
    }

    fn remove_task(&self, task: &ScheduledTask<R>) {
        if self.store.forget(task) {
            self.save_logged();
        }
    }
}
