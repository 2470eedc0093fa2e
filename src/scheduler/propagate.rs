//! Cascading date propagation and edit application.
//!
//! # Algorithm
//!
//! 1. Validate the edit against the current graph. Link additions are
//!    checked for cycles against the would-be graph: `source → target`
//!    closes a cycle iff `target` already reaches `source`.
//! 2. Apply the edit.
//! 3. Walk the leaf tasks in topological order. A task is re-evaluated only
//!    if it was touched by the edit or one of its predecessors moved. Its
//!    start becomes the maximum lower bound over its incoming links
//!    (strict mode: this may move the task earlier as well as later);
//!    tasks without predecessors keep their own start. A start on a
//!    non-working day moves forward to the next working day.
//! 4. Roll changed tasks up into their summary ancestors.
//!
//! # Link Constraints
//!
//! | Type | Constraint |
//! |------|------------|
//! | FS | `t.start >= add(p.end, lag)` |
//! | SS | `t.start >= add(p.start, lag)` |
//! | FF | `t.end >= add(p.end, lag)` |
//! | SF | `t.end >= add(p.start, lag)` |
//!
//! Finish constraints become start bounds by retreating `t.duration`
//! working days.
//!
//! # Complexity
//! O(V + E) per edit: one topological sort plus one pass over the dirty
//! region.

use chrono::NaiveDate;
use std::collections::HashSet;

use super::{Edit, WbsAggregator};
use crate::error::{Error, Result};
use crate::models::{check_duration, check_progress, out_of_range, Link, Task, TaskGraph, WorkCalendar};

/// Applies edits and propagates dates along dependency links.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler<'a> {
    calendar: &'a WorkCalendar,
}

impl<'a> Scheduler<'a> {
    pub fn new(calendar: &'a WorkCalendar) -> Self {
        Self { calendar }
    }

    /// Validates and applies one edit, then propagates and rolls up.
    ///
    /// Returns the IDs of every task whose dates, duration or progress
    /// changed (edited task included), in processing order.
    ///
    /// The edit runs against a copy of the graph that replaces `graph` only
    /// on success. Propagation already walks the whole graph once per edit,
    /// so the copy does not change the cost class.
    ///
    /// # Errors
    /// `CycleDetected`, `InvalidLink`, `InvalidTaskState`,
    /// `InvalidHierarchy` or `DateOutOfRange`. On error the graph is
    /// unchanged.
    pub fn apply(&self, graph: &mut TaskGraph, edit: Edit) -> Result<Vec<String>> {
        let mut staged = graph.clone();
        let changed = self.apply_in_place(&mut staged, edit)?;
        *graph = staged;
        Ok(changed)
    }

    /// Applies one edit directly to `graph`.
    ///
    /// Structural checks run before any mutation, but a `DateOutOfRange`
    /// raised during propagation leaves `graph` partially updated. Callers
    /// must discard it on error.
    pub(crate) fn apply_in_place(&self, graph: &mut TaskGraph, edit: Edit) -> Result<Vec<String>> {
        let kind = edit.kind();
        let full_rollup = matches!(edit, Edit::Recompute);
        let mut moved: Vec<String> = Vec::new();
        let mut stale: Vec<String> = Vec::new();
        let mut rollup: Vec<String> = Vec::new();

        match edit {
            Edit::AddTask(mut task) => {
                let id = task.id.clone();
                let start = task.start;
                task.reschedule(start, self.calendar)?;
                let parent = task.parent.clone();
                graph.add_task(task)?;
                moved.push(id.clone());
                rollup.push(id);
                rollup.extend(parent);
            }
            Edit::RemoveTask { id } => {
                let parent = graph
                    .task(&id)
                    .ok_or_else(|| unknown_task(&id))?
                    .parent
                    .clone();
                let mut subtree = vec![id.clone()];
                subtree.extend(graph.descendant_ids(&id));
                let removed: HashSet<&String> = subtree.iter().collect();
                for task_id in &subtree {
                    for succ in graph.successors_of(task_id) {
                        if !removed.contains(&succ.id) {
                            stale.push(succ.id.clone());
                        }
                    }
                }
                graph.remove_task(&id)?;
                if let Some(parent) = parent {
                    self.settle_former_summary(graph, &parent)?;
                    rollup.push(parent);
                }
            }
            Edit::Reparent { id, parent } => {
                let old_parent = graph
                    .task(&id)
                    .ok_or_else(|| unknown_task(&id))?
                    .parent
                    .clone();
                graph.set_parent(&id, parent.as_deref())?;
                if let Some(old) = old_parent {
                    self.settle_former_summary(graph, &old)?;
                    rollup.push(old);
                }
                rollup.push(id);
            }
            Edit::AddLink(link) => {
                self.check_link(graph, &link)?;
                stale.push(link.target.clone());
                graph.add_link(link)?;
            }
            Edit::RemoveLink { id } => {
                let link = graph.remove_link(&id)?;
                stale.push(link.target);
            }
            Edit::UpdateLink { id, link_type, lag } => {
                let link = graph
                    .link_mut(&id)
                    .ok_or_else(|| Error::InvalidLink(format!("unknown link ID: {id}")))?;
                link.link_type = link_type;
                link.lag = lag;
                stale.push(link.target.clone());
            }
            Edit::SetStart { id, start } => {
                let calendar = self.calendar;
                let task = leaf_mut(graph, &id)?;
                task.reschedule(start, calendar)?;
                moved.push(id);
            }
            Edit::SetDuration { id, duration } => {
                check_duration(&id, duration)?;
                let calendar = self.calendar;
                let task = leaf_mut(graph, &id)?;
                task.duration = duration;
                let start = task.start;
                task.reschedule(start, calendar)?;
                moved.push(id);
            }
            Edit::SetProgress { id, progress } => {
                check_progress(&id, progress)?;
                let task = leaf_mut(graph, &id)?;
                task.progress = progress;
                rollup.push(id.clone());
                moved.push(id);
            }
            Edit::Recompute => {
                stale.extend(graph.leaf_tasks().into_iter().map(|t| t.id.clone()));
            }
        }

        let mut changed = self.propagate(graph, &moved, &stale)?;
        rollup.extend(changed.iter().cloned());

        let aggregator = WbsAggregator::new(self.calendar);
        let rolled = if full_rollup {
            aggregator.rollup_all(graph)
        } else {
            aggregator.rollup_from(graph, &rollup)
        };
        changed.extend(rolled);

        tracing::debug!(edit = kind, changed = changed.len(), "edit applied");
        Ok(changed)
    }

    /// Checks a link for structural validity and acyclicity.
    ///
    /// # Errors
    /// `InvalidLink` for structural problems, `CycleDetected` if the link
    /// would close a cycle.
    pub fn check_link(&self, graph: &TaskGraph, link: &Link) -> Result<()> {
        graph.check_link(link)?;
        if graph.would_create_cycle(&link.source, &link.target) {
            return Err(Error::CycleDetected {
                from: link.source.clone(),
                to: link.target.clone(),
            });
        }
        Ok(())
    }

    /// Earliest start for `successor` implied by one incoming link.
    ///
    /// # Errors
    /// `DateOutOfRange` if the lag or duration pushes the bound outside the
    /// representable date range.
    pub fn link_bound(&self, link: &Link, predecessor: &Task, successor: &Task) -> Result<NaiveDate> {
        let anchor = if link.link_type.from_source_finish() {
            predecessor.end
        } else {
            predecessor.start
        };
        let mut bound = self.calendar.add_work_days(anchor, link.lag);
        if link.link_type.to_target_finish() {
            bound = bound.and_then(|b| self.calendar.add_work_days(b, -successor.duration));
        }
        bound.ok_or_else(|| out_of_range(&successor.id))
    }

    /// Maximum start bound over all incoming links, `None` without any.
    pub fn start_lower_bound(&self, graph: &TaskGraph, id: &str) -> Result<Option<NaiveDate>> {
        let Some(task) = graph.task(id) else {
            return Ok(None);
        };
        let mut best: Option<NaiveDate> = None;
        for link in graph.incoming_links(id) {
            if let Some(pred) = graph.task(&link.source) {
                let bound = self.link_bound(link, pred, task)?;
                best = best.max(Some(bound));
            }
        }
        Ok(best)
    }

    /// Propagates date changes through the dependency graph.
    ///
    /// `moved` are tasks the caller already changed: they are re-evaluated
    /// and their successors are always visited. `stale` tasks are only
    /// re-evaluated; their successors are visited if they move.
    ///
    /// Returns the moved tasks plus every task whose start or end changed.
    pub fn propagate(
        &self,
        graph: &mut TaskGraph,
        moved: &[String],
        stale: &[String],
    ) -> Result<Vec<String>> {
        if moved.is_empty() && stale.is_empty() {
            return Ok(Vec::new());
        }

        let order = graph.topological_order()?;
        let forced: HashSet<&String> = moved.iter().collect();
        let mut dirty: HashSet<String> = moved.iter().chain(stale).cloned().collect();
        let mut changed: Vec<String> = Vec::new();

        for id in order {
            if !dirty.contains(&id) {
                continue;
            }
            let Some(task) = graph.task(&id) else {
                continue;
            };
            let start = self.start_lower_bound(graph, &id)?.unwrap_or(task.start);
            let start = self
                .calendar
                .work_day_on_or_after(start)
                .ok_or_else(|| out_of_range(&id))?;
            let end = self
                .calendar
                .add_work_days(start, task.duration)
                .ok_or_else(|| out_of_range(&id))?;
            let shifted = start != task.start || end != task.end;

            if shifted {
                if let Some(task) = graph.task_mut(&id) {
                    tracing::trace!(task = %id, from = %task.start, to = %start, "task moved");
                    task.start = start;
                    task.end = end;
                }
            }
            if shifted || forced.contains(&id) {
                dirty.extend(graph.successors_of(&id).into_iter().map(|t| t.id.clone()));
                changed.push(id);
            }
        }
        Ok(changed)
    }

    /// Re-evaluates every leaf task.
    pub fn propagate_all(&self, graph: &mut TaskGraph) -> Result<Vec<String>> {
        let all: Vec<String> = graph.leaf_tasks().into_iter().map(|t| t.id.clone()).collect();
        self.propagate(graph, &[], &all)
    }

    /// A summary that lost its last child becomes a leaf again: its end is
    /// rederived from its (rolled-up) start and duration.
    fn settle_former_summary(&self, graph: &mut TaskGraph, id: &str) -> Result<()> {
        if !graph.is_leaf(id) {
            return Ok(());
        }
        match graph.task_mut(id) {
            Some(task) => {
                let start = task.start;
                task.reschedule(start, self.calendar)
            }
            None => Ok(()),
        }
    }
}

fn unknown_task(id: &str) -> Error {
    Error::InvalidTaskState(format!("unknown task ID: {id}"))
}

fn leaf_mut<'g>(graph: &'g mut TaskGraph, id: &str) -> Result<&'g mut Task> {
    if !graph.contains_task(id) {
        return Err(unknown_task(id));
    }
    if !graph.is_leaf(id) {
        return Err(Error::InvalidTaskState(format!(
            "task '{id}' is a summary task; its dates and progress are derived"
        )));
    }
    graph.task_mut(id).ok_or_else(|| unknown_task(id))
}
