//! Lazy walk over a schedule's trigger times.
//!
//! The iterator only moves when the scheduler commits an occurrence, so a
//! manual run or a refused dispatch leaves the pending trigger in place.

use chrono::{DateTime, TimeDelta, Utc};

use crate::core::Schedule;
use crate::util::clock;

/// Occurrences up to this many seconds in the past at iterator creation still fire.
pub const MISFIRE_GRACE_SECS: i64 = 1;

/// Stateful walk over a [`Schedule`]'s trigger times.
///
/// `peek` is idempotent; only `commit` moves the iterator forward. Committing
/// an overdue occurrence skips every other occurrence already in the past, so
/// a scheduler that falls behind fires once instead of replaying the backlog.
#[derive(Debug, Clone)]
pub struct ScheduleIterator {
    schedule: Schedule,
    created_at: DateTime<Utc>,
    not_before: DateTime<Utc>,
    fired: bool,
}

impl ScheduleIterator {
    /// Iterator positioned at `now`.
    #[must_use]
    pub fn new(schedule: Schedule, now: DateTime<Utc>) -> Self {
        Self {
            schedule,
            created_at: now,
            not_before: now - TimeDelta::seconds(MISFIRE_GRACE_SECS),
            fired: false,
        }
    }

    /// Next trigger time, or `None` when the schedule will not fire again.
    #[must_use]
    pub fn peek(&self) -> Option<DateTime<Utc>> {
        match &self.schedule {
            Schedule::Manual => None,
            Schedule::RunNow => (!self.fired).then_some(self.created_at),
            Schedule::Once { start } => (!self.fired).then(|| (*start).max(self.created_at)),
            recurring => {
                let next = recurring.occurrence_at_or_after(self.not_before)?;
                match recurring.end() {
                    Some(end) if next > end => None,
                    _ => Some(next),
                }
            }
        }
    }

    /// Consume the pending occurrence and return it.
    ///
    /// The following occurrence will be strictly after both the consumed one
    /// and `now`.
    pub fn commit(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let fired = self.peek()?;
        self.fired = true;
        self.not_before = fired.max(now) + clock::tick();
        Some(fired)
    }

    /// `true` once a non-manual schedule has no occurrences left.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.schedule.is_manual() && self.peek().is_none()
    }

    /// Schedule being walked.
    #[must_use]
    pub const fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Instant the iterator was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
