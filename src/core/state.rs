//! Task lifecycle states and the legal transitions between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Idle, awaiting a manual trigger or the first schedule tick.
    Submitted,
    /// Triggered, but admission control deferred execution.
    Sleeping,
    /// Body is executing.
    Running,
    /// Cancellation requested while executing; waiting for the body to stop.
    Cancelling,
    /// Cancelled. Terminal.
    Cancelled,
    /// A run completed and the schedule has further occurrences.
    Waiting,
    /// The last run failed; the cause is kept for inspection.
    Broken,
    /// Schedule exhausted after a successful run. Terminal.
    Finished,
}

impl TaskState {
    /// `Running` or `Cancelling`: a body is (still) executing.
    #[must_use]
    pub const fn is_executing(self) -> bool {
        matches!(self, Self::Running | Self::Cancelling)
    }

    /// States reported by `Scheduler::get_active_tasks`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Sleeping | Self::Cancelling)
    }

    /// Idle states from which a trigger may start a run.
    #[must_use]
    pub const fn is_runnable(self) -> bool {
        matches!(self, Self::Submitted | Self::Waiting | Self::Broken)
    }

    /// `Cancelled` or `Finished`.
    #[must_use]
    pub const fn is_ending(self) -> bool {
        matches!(self, Self::Cancelled | Self::Finished)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use TaskState::{
            Broken, Cancelled, Cancelling, Finished, Running, Sleeping, Submitted, Waiting,
        };
        match self {
            Submitted | Waiting | Broken => {
                matches!(next, Running | Sleeping | Cancelled | Submitted)
            }
            Sleeping => matches!(next, Running | Submitted | Waiting | Cancelled),
            Running => matches!(
                next,
                Cancelling | Waiting | Finished | Broken | Submitted | Cancelled
            ),
            Cancelling => matches!(next, Cancelled | Submitted | Waiting | Broken),
            Cancelled | Finished => false,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submitted => "SUBMITTED",
            Self::Sleeping => "SLEEPING",
            Self::Running => "RUNNING",
            Self::Cancelling => "CANCELLING",
            Self::Cancelled => "CANCELLED",
            Self::Waiting => "WAITING",
            Self::Broken => "BROKEN",
            Self::Finished => "FINISHED",
        };
        f.write_str(name)
    }
}
