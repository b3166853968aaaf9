//! Task registry with admission control.
//!
//! Holds every registered task grouped by type, plus one FIFO of sleeping
//! task ids per type. The scheduler guards the registry with a single mutex;
//! while it is held, individual task mutexes may be taken one at a time.

use std::collections::{HashMap, VecDeque};

use crate::core::{ActiveTasks, ScheduledTask, TaskSummary};
use crate::util::serde::TaskId;

pub(crate) struct TaskRegistry<R: 'static> {
    by_type: HashMap<String, Vec<ScheduledTask<R>>>,
    by_id: HashMap<TaskId, ScheduledTask<R>>,
    sleeping: HashMap<String, VecDeque<TaskId>>,
}

impl<R: 'static> Default for TaskRegistry<R> {
    fn default() -> Self {
        Self {
            by_type: HashMap::new(),
            by_id: HashMap::new(),
            sleeping: HashMap::new(),
        }
    }
}

impl<R: 'static> TaskRegistry<R> {
    pub fn insert(&mut self, task: ScheduledTask<R>) {
        self.by_type
            .entry(task.task_type().to_owned())
            .or_default()
            .push(task.clone());
        self.by_id.insert(task.id().clone(), task);
    }

    /// Remove a task, including any sleeping entry. Empty type groups are dropped.
    pub fn remove(&mut self, id: &TaskId) -> Option<ScheduledTask<R>> {
        let task = self.by_id.remove(id)?;
        let task_type = task.task_type();
        if let Some(group) = self.by_type.get_mut(task_type) {
            group.retain(|t| t.id() != id);
            if group.is_empty() {
                self.by_type.remove(task_type);
            }
        }
        self.dequeue_sleeping(task_type, id);
        Some(task)
    }

    pub fn get(&self, id: &TaskId) -> Option<&ScheduledTask<R>> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Every task, grouped by type in registration order.
    pub fn all(&self) -> impl Iterator<Item = &ScheduledTask<R>> {
        self.by_type.values().flatten()
    }

    pub fn by_type(&self) -> &HashMap<String, Vec<ScheduledTask<R>>> {
        &self.by_type
    }

    /// Summaries of the tasks of `task_type`, skipping `exclude`.
    ///
    /// Locks each listed task in turn; the caller must not hold the lock of
    /// any task of this type.
    pub fn others_of_type(&self, task_type: &str, exclude: Option<&TaskId>) -> ActiveTasks {
        let tasks: Vec<TaskSummary> = self
            .by_type
            .get(task_type)
            .into_iter()
            .flatten()
            .filter(|t| Some(t.id()) != exclude)
            .map(ScheduledTask::summary)
            .collect();
        ActiveTasks::new(task_type, tasks)
    }

    /// Whether a new task of `task`'s type may be registered.
    pub fn admits_submission(&self, task: &ScheduledTask<R>) -> bool {
        let Some(policy) = task.core.work.concurrency_policy() else {
            return true;
        };
        let others = self.others_of_type(task.task_type(), Some(task.id()));
        others.is_empty() || policy.allow_concurrent_submission(&others)
    }

    /// Whether a trigger of `task` may start executing now.
    pub fn admits_execution(&self, task: &ScheduledTask<R>) -> bool {
        let Some(policy) = task.core.work.concurrency_policy() else {
            return true;
        };
        let others = self.others_of_type(task.task_type(), Some(task.id()));
        !others.any_executing() || policy.allow_concurrent_execution(&others)
    }

    pub fn enqueue_sleeping(&mut self, task_type: &str, id: TaskId) {
        self.sleeping
            .entry(task_type.to_owned())
            .or_default()
            .push_back(id);
    }

    pub fn requeue_sleeping_front(&mut self, task_type: &str, id: TaskId) {
        self.sleeping
            .entry(task_type.to_owned())
            .or_default()
            .push_front(id);
    }

    pub fn dequeue_sleeping(&mut self, task_type: &str, id: &TaskId) -> bool {
        let Some(queue) = self.sleeping.get_mut(task_type) else {
            return false;
        };
        let before = queue.len();
        queue.retain(|queued| queued != id);
        let removed = queue.len() != before;
        if queue.is_empty() {
            self.sleeping.remove(task_type);
        }
        removed
    }

    pub fn sleeping_head(&self, task_type: &str) -> Option<&TaskId> {
        self.sleeping.get(task_type).and_then(VecDeque::front)
    }

    pub fn pop_sleeping(&mut self, task_type: &str) -> Option<TaskId> {
        let queue = self.sleeping.get_mut(task_type)?;
        let id = queue.pop_front();
        if queue.is_empty() {
            self.sleeping.remove(task_type);
        }
        id
    }

    pub fn sleeping_types(&self) -> Vec<String> {
        self.sleeping.keys().cloned().collect()
    }

    pub fn sleeping_len(&self, task_type: &str) -> usize {
        self.sleeping.get(task_type).map_or(0, VecDeque::len)
    }
}
