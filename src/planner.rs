//! The planning session: one graph, one calendar, one edit gateway.
//!
//! Every mutation goes through [`Planner::apply_mutation`] (or
//! [`Planner::apply_batch`]), which validates the edit, cascades dates and
//! rolls up summaries. Analyses are computed on demand from the current
//! graph.

use std::collections::HashSet;

use crate::analysis::{CriticalPathAnalyzer, CriticalPathOptions, CriticalPathReport, WorkloadReport};
use crate::config::PlannerConfig;
use crate::error::{Error, Result};
use crate::models::{Link, Task, TaskGraph, WorkCalendar};
use crate::scheduler::{Edit, Scheduler};
use crate::validation::validate_project;

/// Owns a task graph and applies edits to it.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use u_plan::models::{Link, Task, WorkCalendar};
/// use u_plan::scheduler::Edit;
/// use u_plan::{Error, Planner};
///
/// let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let mut planner = Planner::new(WorkCalendar::new());
/// for (id, duration) in [("A", 2), ("B", 3), ("C", 1)] {
///     planner
///         .apply_mutation(Edit::AddTask(Task::new(id, monday).with_duration(duration)))
///         .unwrap();
/// }
/// planner.apply_mutation(Edit::AddLink(Link::new("L1", "A", "B"))).unwrap();
/// planner.apply_mutation(Edit::AddLink(Link::new("L2", "B", "C"))).unwrap();
///
/// // B starts when A ends (Wed), C when B ends (Mon).
/// let c = planner.graph().task("C").unwrap();
/// assert_eq!(c.start, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
///
/// let err = planner
///     .apply_mutation(Edit::AddLink(Link::new("L3", "C", "A")))
///     .unwrap_err();
/// assert!(matches!(err, Error::CycleDetected { .. }));
/// assert_eq!(planner.graph().link_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Planner {
    graph: TaskGraph,
    calendar: WorkCalendar,
    options: CriticalPathOptions,
}

impl Planner {
    /// Creates an empty planner.
    pub fn new(calendar: WorkCalendar) -> Self {
        Self {
            graph: TaskGraph::new(),
            calendar,
            options: CriticalPathOptions::default(),
        }
    }

    /// Creates an empty planner from configuration.
    ///
    /// # Errors
    /// `InvalidCalendar` if the configuration leaves no working day.
    pub fn with_config(config: &PlannerConfig) -> Result<Self> {
        let calendar = config.work_calendar()?;
        Ok(Self::new(calendar).with_options(config.critical_path))
    }

    /// Sets the critical path options used by [`critical_path`](Self::critical_path).
    pub fn with_options(mut self, options: CriticalPathOptions) -> Self {
        self.options = options;
        self
    }

    /// Loads a whole project at once.
    ///
    /// The input is validated up front and every problem is reported
    /// together. Stored leaf dates are then brought in line with the links
    /// and the calendar, and summaries are rolled up.
    ///
    /// The planner starts with default critical path options. Chain
    /// [`with_options`](Self::with_options) to change them.
    ///
    /// # Errors
    /// `Validation` with every detected problem, or `DateOutOfRange` if a
    /// task cannot be placed within the supported date range.
    pub fn from_parts(tasks: Vec<Task>, links: Vec<Link>, calendar: WorkCalendar) -> Result<Self> {
        validate_project(&tasks, &links, &calendar).map_err(Error::Validation)?;

        let mut graph = TaskGraph::new();
        let mut hierarchy = Vec::new();
        for mut task in tasks {
            if let Some(parent) = task.parent.take() {
                hierarchy.push((task.id.clone(), parent));
            }
            graph.add_task(task)?;
        }
        for (id, parent) in &hierarchy {
            graph.set_parent(id, Some(parent))?;
        }
        for link in links {
            graph.add_link(link)?;
        }

        let changed = Scheduler::new(&calendar).apply_in_place(&mut graph, Edit::Recompute)?;
        tracing::debug!(
            tasks = graph.task_count(),
            links = graph.link_count(),
            adjusted = changed.len(),
            "project loaded"
        );

        Ok(Self::new(calendar).with_graph(graph))
    }

    fn with_graph(mut self, graph: TaskGraph) -> Self {
        self.graph = graph;
        self
    }

    /// The current graph.
    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// The working-day calendar.
    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    /// The configured critical path options.
    pub fn options(&self) -> &CriticalPathOptions {
        &self.options
    }

    /// Validates and applies one edit.
    ///
    /// Returns the IDs of every task whose dates, duration or progress
    /// changed. On error the graph is exactly as before the call.
    ///
    /// # Errors
    /// `CycleDetected`, `InvalidLink`, `InvalidTaskState`,
    /// `InvalidHierarchy` or `DateOutOfRange`.
    pub fn apply_mutation(&mut self, edit: Edit) -> Result<Vec<String>> {
        let kind = edit.kind();
        Scheduler::new(&self.calendar)
            .apply(&mut self.graph, edit)
            .inspect_err(|e| tracing::debug!(edit = kind, error = %e, "edit rejected"))
    }

    /// Applies edits in order, all or nothing.
    ///
    /// Edits run against a copy of the graph that replaces the current one
    /// only once every edit has succeeded. Returns the changed task IDs,
    /// each once, in first-change order.
    ///
    /// # Errors
    /// The first failing edit's error; the graph is left untouched.
    pub fn apply_batch(&mut self, edits: Vec<Edit>) -> Result<Vec<String>> {
        let scheduler = Scheduler::new(&self.calendar);
        let mut staged = self.graph.clone();
        let mut seen = HashSet::new();
        let mut changed = Vec::new();

        for (index, edit) in edits.into_iter().enumerate() {
            let kind = edit.kind();
            let ids = scheduler.apply_in_place(&mut staged, edit).inspect_err(|e| {
                tracing::debug!(edit = kind, index, error = %e, "batch rejected")
            })?;
            changed.extend(ids.into_iter().filter(|id| seen.insert(id.clone())));
        }

        self.graph = staged;
        Ok(changed)
    }

    /// Runs critical path analysis with explicit options.
    pub fn compute_critical_path(&self, options: &CriticalPathOptions) -> CriticalPathReport {
        CriticalPathAnalyzer::new(*options).analyze(&self.graph)
    }

    /// Runs critical path analysis with the planner's configured options.
    pub fn critical_path(&self) -> CriticalPathReport {
        self.compute_critical_path(&self.options)
    }

    /// Per-owner workload of the current plan.
    pub fn workload(&self) -> WorkloadReport {
        WorkloadReport::calculate(&self.graph, &self.calendar)
    }
}
