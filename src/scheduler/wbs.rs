//! Work breakdown structure rollup.
//!
//! A summary task's span and progress are derived from its direct children:
//!
//! - `start = min(child.start)`, `end = max(child.end)`
//! - `duration` = working days in `[start, end)`
//! - `progress = Σ(child.progress × child.duration) / Σ(child.duration)`
//!
//! Zero-duration children carry zero weight. When every child has zero
//! duration the summary progress is 0.
//!
//! Rollup runs bottom-up: a summary is recomputed only after all summaries
//! below it.

use chrono::NaiveDate;

use crate::models::{Task, TaskGraph, WorkCalendar};

/// Derived values of a summary task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rollup {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub duration: i64,
    pub progress: f64,
}

/// Recomputes summary tasks from their children.
#[derive(Debug, Clone, Copy)]
pub struct WbsAggregator<'a> {
    calendar: &'a WorkCalendar,
}

impl<'a> WbsAggregator<'a> {
    pub fn new(calendar: &'a WorkCalendar) -> Self {
        Self { calendar }
    }

    /// Computes the rollup of a set of children. `None` for no children.
    pub fn summarize(&self, children: &[&Task]) -> Option<Rollup> {
        let start = children.iter().map(|c| c.start).min()?;
        let end = children.iter().map(|c| c.end).max()?;

        let total_weight: i64 = children.iter().map(|c| c.duration).sum();
        let progress = if total_weight > 0 {
            let done: f64 = children
                .iter()
                .map(|c| c.progress * c.duration as f64)
                .sum();
            done / total_weight as f64
        } else {
            0.0
        };

        Some(Rollup {
            start,
            end,
            duration: self.calendar.work_days_between(start, end).max(0),
            progress,
        })
    }

    /// Recomputes one summary task from its direct children.
    ///
    /// Returns `true` if any derived field changed. Leaf tasks are left as
    /// they are.
    pub fn rollup_task(&self, graph: &mut TaskGraph, id: &str) -> bool {
        let Some(rollup) = self.summarize(&graph.children_of(id)) else {
            return false;
        };
        let Some(task) = graph.task_mut(id) else {
            return false;
        };
        let changed = task.start != rollup.start
            || task.end != rollup.end
            || task.duration != rollup.duration
            || task.progress != rollup.progress;
        if changed {
            task.start = rollup.start;
            task.end = rollup.end;
            task.duration = rollup.duration;
            task.progress = rollup.progress;
            tracing::trace!(
                task = %id,
                start = %rollup.start,
                end = %rollup.end,
                progress = rollup.progress,
                "summary rolled up"
            );
        }
        changed
    }

    /// Recomputes every summary among `ids` and their ancestors, deepest
    /// first. Returns the summaries whose values changed.
    pub fn rollup_from(&self, graph: &mut TaskGraph, ids: &[String]) -> Vec<String> {
        let mut summaries: Vec<(usize, String)> = Vec::new();
        for id in ids {
            if graph.contains_task(id) && !graph.is_leaf(id) {
                summaries.push((graph.depth(id), id.clone()));
            }
            for ancestor in graph.ancestors_of(id) {
                summaries.push((graph.depth(&ancestor.id), ancestor.id.clone()));
            }
        }
        self.rollup_ordered(graph, summaries)
    }

    /// Recomputes every summary task in the graph, bottom-up.
    pub fn rollup_all(&self, graph: &mut TaskGraph) -> Vec<String> {
        let summaries: Vec<(usize, String)> = graph
            .tasks()
            .filter(|t| !graph.is_leaf(&t.id))
            .map(|t| (graph.depth(&t.id), t.id.clone()))
            .collect();
        self.rollup_ordered(graph, summaries)
    }

    fn rollup_ordered(
        &self,
        graph: &mut TaskGraph,
        mut summaries: Vec<(usize, String)>,
    ) -> Vec<String> {
        summaries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        summaries.dedup();

        summaries
            .into_iter()
            .filter(|(_, id)| self.rollup_task(graph, id))
            .map(|(_, id)| id)
            .collect()
    }
}
