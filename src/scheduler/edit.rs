//! Graph-affecting edits.
//!
//! An [`Edit`] is one already-shaped change coming from an outer layer
//! (UI, import, API). Edits are applied through
//! [`Planner::apply_mutation`](crate::Planner::apply_mutation).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Link, LinkType, Task};

/// A single edit to the plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Edit {
    /// Adds a task (and makes its parent, if any, a summary task).
    AddTask(Task),
    /// Removes a task, its subtree, and every link touching them.
    RemoveTask { id: String },
    /// Moves a task under another parent (`None` = top level).
    Reparent { id: String, parent: Option<String> },
    /// Adds a dependency link.
    AddLink(Link),
    /// Removes a dependency link.
    RemoveLink { id: String },
    /// Changes the kind and lag of an existing link.
    UpdateLink {
        id: String,
        link_type: LinkType,
        lag: i64,
    },
    /// Moves a leaf task to a new start date.
    SetStart { id: String, start: NaiveDate },
    /// Changes a leaf task's duration.
    SetDuration { id: String, duration: i64 },
    /// Changes a leaf task's progress.
    SetProgress { id: String, progress: f64 },
    /// Re-propagates the whole graph without changing anything.
    Recompute,
}

impl Edit {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Edit::AddTask(_) => "add_task",
            Edit::RemoveTask { .. } => "remove_task",
            Edit::Reparent { .. } => "reparent",
            Edit::AddLink(_) => "add_link",
            Edit::RemoveLink { .. } => "remove_link",
            Edit::UpdateLink { .. } => "update_link",
            Edit::SetStart { .. } => "set_start",
            Edit::SetDuration { .. } => "set_duration",
            Edit::SetProgress { .. } => "set_progress",
            Edit::Recompute => "recompute",
        }
    }

    /// Creates a remove-task edit.
    pub fn remove_task(id: impl Into<String>) -> Self {
        Edit::RemoveTask { id: id.into() }
    }

    /// Creates a remove-link edit.
    pub fn remove_link(id: impl Into<String>) -> Self {
        Edit::RemoveLink { id: id.into() }
    }

    /// Creates a set-start edit.
    pub fn set_start(id: impl Into<String>, start: NaiveDate) -> Self {
        Edit::SetStart {
            id: id.into(),
            start,
        }
    }

    /// Creates a set-duration edit.
    pub fn set_duration(id: impl Into<String>, duration: i64) -> Self {
        Edit::SetDuration {
            id: id.into(),
            duration,
        }
    }

    /// Creates a set-progress edit.
    pub fn set_progress(id: impl Into<String>, progress: f64) -> Self {
        Edit::SetProgress {
            id: id.into(),
            progress,
        }
    }

    /// Creates a reparent edit.
    pub fn reparent(id: impl Into<String>, parent: Option<&str>) -> Self {
        Edit::Reparent {
            id: id.into(),
            parent: parent.map(str::to_string),
        }
    }
}
