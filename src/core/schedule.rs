//! Schedule definitions.
//!
//! A [`Schedule`] pairs a start/end window with a recurrence rule. It is pure
//! data; the stateful walk over its trigger times lives in
//! [`ScheduleIterator`](crate::core::ScheduleIterator).

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::core::{ScheduleIterator, SchedulerError};

const HOUR_SECS: i64 = 60 * 60;
const DAY_SECS: i64 = 24 * HOUR_SECS;

/// How far ahead a monthly schedule searches for a matching day.
const MONTH_SEARCH_LIMIT: usize = 48;

/// When a task should run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Never triggers on its own; runs only through `run_now`.
    Manual,
    /// Triggers once, immediately.
    RunNow,
    /// Triggers once at `start` (immediately if `start` has passed).
    Once {
        /// Trigger time.
        start: DateTime<Utc>,
    },
    /// Every hour from `start`.
    Hourly {
        /// First trigger.
        start: DateTime<Utc>,
        /// Last instant a trigger may fall on.
        end: Option<DateTime<Utc>>,
    },
    /// Every day at `start`'s time of day.
    Daily {
        /// First trigger.
        start: DateTime<Utc>,
        /// Last instant a trigger may fall on.
        end: Option<DateTime<Utc>>,
    },
    /// Every allowed weekday at `start`'s time of day.
    Weekly {
        /// Earliest trigger.
        start: DateTime<Utc>,
        /// Last instant a trigger may fall on.
        end: Option<DateTime<Utc>>,
        /// Weekdays on which the task runs, Monday first.
        days: Vec<Weekday>,
    },
    /// Selected days of every month at `start`'s time of day. Days a month
    /// does not have (e.g. the 31st in April) are skipped.
    Monthly {
        /// Earliest trigger.
        start: DateTime<Utc>,
        /// Last instant a trigger may fall on.
        end: Option<DateTime<Utc>>,
        /// Days of the month, 1 to 31.
        days_of_month: BTreeSet<u32>,
    },
    /// Every `interval_secs` seconds from `start`.
    Every {
        /// First trigger.
        start: DateTime<Utc>,
        /// Last instant a trigger may fall on.
        end: Option<DateTime<Utc>>,
        /// Step between triggers, in seconds.
        interval_secs: u64,
    },
}

impl Schedule {
    /// Manual-only schedule.
    #[must_use]
    pub const fn manual() -> Self {
        Self::Manual
    }

    /// Run once, immediately.
    #[must_use]
    pub const fn run_now() -> Self {
        Self::RunNow
    }

    /// Run once at `start`.
    #[must_use]
    pub const fn once(start: DateTime<Utc>) -> Self {
        Self::Once { start }
    }

    /// Hourly from `start` until `end`.
    #[must_use]
    pub const fn hourly(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self::Hourly { start, end }
    }

    /// Daily from `start` until `end`.
    #[must_use]
    pub const fn daily(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self::Daily { start, end }
    }

    /// Weekly on `days` from `start` until `end`.
    #[must_use]
    pub fn weekly(
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        days: impl IntoIterator<Item = Weekday>,
    ) -> Self {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        days.sort_by_key(Weekday::num_days_from_monday);
        days.dedup();
        Self::Weekly { start, end, days }
    }

    /// Monthly on `days_of_month` from `start` until `end`.
    #[must_use]
    pub fn monthly(
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        days_of_month: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self::Monthly {
            start,
            end,
            days_of_month: days_of_month.into_iter().collect(),
        }
    }

    /// Every `interval` (whole seconds) from `start` until `end`.
    #[must_use]
    pub const fn every(
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        interval: std::time::Duration,
    ) -> Self {
        Self::Every {
            start,
            end,
            interval_secs: interval.as_secs(),
        }
    }

    /// Check the schedule for values that can never produce a trigger.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidSchedule` describing the first problem found.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if let (Some(start), Some(end)) = (self.start(), self.end()) {
            if end < start {
                return Err(SchedulerError::InvalidSchedule(format!(
                    "end {end} is before start {start}"
                )));
            }
        }
        match self {
            Self::Weekly { days, .. } if days.is_empty() => Err(SchedulerError::InvalidSchedule(
                "weekly schedule needs at least one weekday".into(),
            )),
            Self::Monthly { days_of_month, .. } => {
                if days_of_month.is_empty() {
                    return Err(SchedulerError::InvalidSchedule(
                        "monthly schedule needs at least one day".into(),
                    ));
                }
                match days_of_month.iter().find(|d| !(1..=31).contains(*d)) {
                    Some(day) => Err(SchedulerError::InvalidSchedule(format!(
                        "day of month {day} out of range 1..=31"
                    ))),
                    None => Ok(()),
                }
            }
            Self::Every { interval_secs: 0, .. } => Err(SchedulerError::InvalidSchedule(
                "interval must be at least one second".into(),
            )),
            _ => Ok(()),
        }
    }

    /// `true` for [`Schedule::Manual`].
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        matches!(self, Self::Manual)
    }

    /// `true` for schedules that trigger at most once.
    #[must_use]
    pub const fn is_one_shot(&self) -> bool {
        matches!(self, Self::RunNow | Self::Once { .. })
    }

    /// `true` for calendar-stepped schedules.
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        !self.is_manual() && !self.is_one_shot()
    }

    /// Start of the schedule window, if the kind has one.
    #[must_use]
    pub const fn start(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Manual | Self::RunNow => None,
            Self::Once { start }
            | Self::Hourly { start, .. }
            | Self::Daily { start, .. }
            | Self::Weekly { start, .. }
            | Self::Monthly { start, .. }
            | Self::Every { start, .. } => Some(*start),
        }
    }

    /// End of the schedule window, if any.
    #[must_use]
    pub const fn end(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Hourly { end, .. }
            | Self::Daily { end, .. }
            | Self::Weekly { end, .. }
            | Self::Monthly { end, .. }
            | Self::Every { end, .. } => *end,
            _ => None,
        }
    }

    /// Short lowercase name of the schedule kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::RunNow => "run_now",
            Self::Once { .. } => "once",
            Self::Hourly { .. } => "hourly",
            Self::Daily { .. } => "daily",
            Self::Weekly { .. } => "weekly",
            Self::Monthly { .. } => "monthly",
            Self::Every { .. } => "every",
        }
    }

    /// Fresh iterator over this schedule's trigger times, starting now.
    #[must_use]
    pub fn iterator(&self) -> ScheduleIterator {
        ScheduleIterator::new(self.clone(), crate::util::clock::now())
    }

    /// Fresh iterator over this schedule's trigger times, starting at `now`.
    #[must_use]
    pub fn iterator_at(&self, now: DateTime<Utc>) -> ScheduleIterator {
        ScheduleIterator::new(self.clone(), now)
    }

    /// First calendar occurrence at or after `t`, ignoring the end bound.
    ///
    /// Only meaningful for recurring kinds; one-shot and manual schedules
    /// are handled by the iterator itself.
    pub(crate) fn occurrence_at_or_after(&self, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Manual | Self::RunNow | Self::Once { .. } => None,
            Self::Hourly { start, .. } => step_at_or_after(*start, HOUR_SECS, t),
            Self::Daily { start, .. } => step_at_or_after(*start, DAY_SECS, t),
            Self::Every {
                start,
                interval_secs,
                ..
            } => step_at_or_after(*start, i64::try_from(*interval_secs).ok()?, t),
            Self::Weekly { start, days, .. } => {
                let mut candidate = step_at_or_after(*start, DAY_SECS, t)?;
                for _ in 0..7 {
                    if days.contains(&candidate.weekday()) {
                        return Some(candidate);
                    }
                    candidate = candidate.checked_add_signed(TimeDelta::days(1))?;
                }
                None
            }
            Self::Monthly {
                start,
                days_of_month,
                ..
            } => monthly_at_or_after(*start, days_of_month, t),
        }
    }
}

/// First `start + k * step` (k >= 0) that is at or after `t`.
fn step_at_or_after(start: DateTime<Utc>, step_secs: i64, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if step_secs <= 0 {
        return None;
    }
    if t <= start {
        return Some(start);
    }
    let elapsed = t - start;
    let elapsed_ns = i128::from(elapsed.num_seconds()) * 1_000_000_000
        + i128::from(elapsed.subsec_nanos());
    let step_ns = i128::from(step_secs) * 1_000_000_000;
    let steps = (elapsed_ns + step_ns - 1) / step_ns;
    let offset = i64::try_from(steps.checked_mul(i128::from(step_secs))?).ok()?;
    start.checked_add_signed(TimeDelta::try_seconds(offset)?)
}

fn monthly_at_or_after(
    start: DateTime<Utc>,
    days_of_month: &BTreeSet<u32>,
    t: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let floor = t.max(start);
    let time = start.time();
    let (mut year, mut month) = (floor.year(), floor.month());
    for _ in 0..MONTH_SEARCH_LIMIT {
        for &day in days_of_month {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                let candidate = date.and_time(time).and_utc();
                if candidate >= floor {
                    return Some(candidate);
                }
            }
        }
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    None
}
