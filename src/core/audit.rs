//! Audit sink implementations.
//!
//! The scheduler reports every lifecycle step of every task to an
//! [`AuditSink`]. The default sink forwards to `tracing`; the in-memory sink
//! keeps a bounded history for tests and diagnostics.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::util::clock::now_ms;
use crate::util::serde::TaskId;

/// Lifecycle step recorded for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Task registered.
    Submitted,
    /// Body dispatched to a worker.
    Started,
    /// Trigger deferred by admission control.
    Sleeping,
    /// Deferred trigger admitted.
    Promoted,
    /// Body returned a value.
    Completed,
    /// Body returned an error or panicked.
    Broken,
    /// Cancellation requested while the body runs.
    Cancelling,
    /// Task reached `Cancelled`.
    Cancelled,
    /// Task pruned from the registry.
    Removed,
    /// Occurrence consumed without running (task disabled).
    Skipped,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submitted => "submitted",
            Self::Started => "started",
            Self::Sleeping => "sleeping",
            Self::Promoted => "promoted",
            Self::Completed => "completed",
            Self::Broken => "broken",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Removed => "removed",
            Self::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related task identifier.
    pub task_id: TaskId,
    /// Task type (admission key).
    pub task_type: String,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: i64,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// Sink that forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        debug!(
            task_id = %event.task_id,
            task_type = %event.task_type,
            action = %event.action,
            detail = event.detail.as_deref().unwrap_or(""),
            "task audit"
        );
    }
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events: max_events.max(1),
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Ids of tasks that recorded `action`, oldest first.
    #[must_use]
    pub fn tasks_with_action(&self, action: AuditAction) -> Vec<TaskId> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .map(|e| e.task_id.clone())
            .collect()
    }

    /// Actions recorded for one task, oldest first.
    #[must_use]
    pub fn actions_for(&self, task_id: &TaskId) -> Vec<AuditAction> {
        self.events
            .lock()
            .iter()
            .filter(|e| &e.task_id == task_id)
            .map(|e| e.action)
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    task_id: &TaskId,
    task_type: impl Into<String>,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        task_id: task_id.clone(),
        task_type: task_type.into(),
        action,
        created_at_ms: now_ms(),
        detail,
    }
}
