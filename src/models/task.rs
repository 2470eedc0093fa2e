//! Task model.
//!
//! A task is a unit of planned work with a calendar span. Leaf tasks carry
//! their own dates; summary tasks (tasks with children) have their span and
//! progress derived from their children.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::WorkCalendar;
use crate::error::{Error, Result};

/// A planned task.
///
/// # Date Invariant
/// For leaf tasks, `start` is a working day and
/// `Some(end) == calendar.add_work_days(start, duration)` after every
/// committed edit. Summary task dates are written only by the WBS rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique, stable task identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// First day of work.
    pub start: NaiveDate,
    /// `start` advanced by `duration` working days.
    pub end: NaiveDate,
    /// Length in working days (non-negative).
    pub duration: i64,
    /// Completion fraction in `[0, 1]`.
    pub progress: f64,
    /// Parent (summary) task in the WBS hierarchy.
    pub parent: Option<String>,
    /// Person or team the work is assigned to (workload reporting only).
    pub owner: Option<String>,
    /// Domain-specific key-value metadata.
    pub attributes: HashMap<String, String>,
}

impl Task {
    /// Creates a zero-duration task starting on `start`.
    pub fn new(id: impl Into<String>, start: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            start,
            end: start,
            duration: 0,
            progress: 0.0,
            parent: None,
            owner: None,
            attributes: HashMap::new(),
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the duration in working days.
    ///
    /// `end` is rederived when the task is committed to a planner.
    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the completion fraction.
    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    /// Places the task under a summary task.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Assigns the task to an owner.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Moves the task to `start` and rederives `end` from its duration.
    ///
    /// A start on a non-working day is moved forward to the next working
    /// day, so the span always holds exactly `duration` working days.
    ///
    /// # Errors
    /// `DateOutOfRange` if the span leaves the representable date range;
    /// the task is left unchanged.
    pub fn reschedule(&mut self, start: NaiveDate, calendar: &WorkCalendar) -> Result<()> {
        let start = calendar
            .work_day_on_or_after(start)
            .ok_or_else(|| out_of_range(&self.id))?;
        let end = calendar
            .add_work_days(start, self.duration)
            .ok_or_else(|| out_of_range(&self.id))?;
        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Whether the task is a zero-duration milestone.
    pub fn is_milestone(&self) -> bool {
        self.duration == 0
    }

    /// Checks duration and progress bounds.
    ///
    /// # Errors
    /// `InvalidTaskState` for a negative duration or a progress outside
    /// `[0, 1]` (including NaN). Values are never clamped.
    pub fn check_state(&self) -> Result<()> {
        check_duration(&self.id, self.duration)?;
        check_progress(&self.id, self.progress)
    }
}

pub(crate) fn out_of_range(id: &str) -> Error {
    Error::DateOutOfRange(format!(
        "task '{id}' would be scheduled outside the supported date range"
    ))
}

pub(crate) fn check_duration(id: &str, duration: i64) -> Result<()> {
    if duration < 0 {
        return Err(Error::InvalidTaskState(format!(
            "task '{id}' has negative duration {duration}"
        )));
    }
    Ok(())
}

pub(crate) fn check_progress(id: &str, progress: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&progress) {
        return Err(Error::InvalidTaskState(format!(
            "task '{id}' has progress {progress} outside [0, 1]"
        )));
    }
    Ok(())
}
