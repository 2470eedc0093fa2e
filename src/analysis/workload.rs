//! Per-owner workload reporting.
//!
//! Summarizes how leaf-task work is spread across owners. This is reporting
//! only: nothing here moves tasks to resolve overload.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total work days | Sum of leaf durations assigned to the owner |
//! | Task count | Number of leaf tasks assigned to the owner |
//! | Daily load | Leaf tasks of the owner active on each working day |
//! | Peak | Highest daily load (earliest date on ties) |
//!
//! A task is active on every working day in `[start, end)`; milestones add
//! no load.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{TaskGraph, WorkCalendar};

/// Workload of one owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerLoad {
    /// Sum of assigned leaf durations.
    pub total_work_days: i64,
    /// Number of assigned leaf tasks.
    pub task_count: usize,
    /// Active task count per working day.
    pub daily_load: BTreeMap<NaiveDate, usize>,
}

impl OwnerLoad {
    /// Busiest date and its load. `None` if the owner has no active day.
    pub fn peak(&self) -> Option<(NaiveDate, usize)> {
        self.daily_load
            .iter()
            .fold(None, |best, (&date, &load)| match best {
                Some((_, top)) if top >= load => best,
                _ => Some((date, load)),
            })
    }

    /// Mean load over the days the owner is active.
    pub fn average_daily_load(&self) -> f64 {
        if self.daily_load.is_empty() {
            return 0.0;
        }
        let sum: usize = self.daily_load.values().sum();
        sum as f64 / self.daily_load.len() as f64
    }
}

/// Workload across all owners.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadReport {
    /// Per-owner load, keyed by owner.
    pub by_owner: BTreeMap<String, OwnerLoad>,
    /// Leaf work days with no owner.
    pub unassigned_work_days: i64,
}

impl WorkloadReport {
    /// Computes workload from the leaf tasks of a graph.
    ///
    /// # Arguments
    /// * `graph` - The task graph.
    /// * `calendar` - Calendar deciding which days count as active.
    pub fn calculate(graph: &TaskGraph, calendar: &WorkCalendar) -> Self {
        let mut report = Self::default();

        for task in graph.leaf_tasks() {
            let Some(owner) = task.owner.as_deref() else {
                report.unassigned_work_days += task.duration;
                continue;
            };

            let load = report.by_owner.entry(owner.to_string()).or_default();
            load.total_work_days += task.duration;
            load.task_count += 1;

            let mut day = calendar.work_day_on_or_after(task.start);
            while let Some(current) = day.filter(|d| *d < task.end) {
                *load.daily_load.entry(current).or_insert(0) += 1;
                day = calendar.next_work_day(current);
            }
        }

        report
    }

    /// Load of one owner.
    pub fn owner(&self, owner: &str) -> Option<&OwnerLoad> {
        self.by_owner.get(owner)
    }

    /// `(owner, date, load)` for every day an owner exceeds `capacity`.
    pub fn overloaded(&self, capacity: usize) -> Vec<(&str, NaiveDate, usize)> {
        self.by_owner
            .iter()
            .flat_map(|(owner, load)| {
                load.daily_load
                    .iter()
                    .filter(move |(_, &n)| n > capacity)
                    .map(move |(&date, &n)| (owner.as_str(), date, n))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn owned(id: &str, start: NaiveDate, duration: i64, owner: &str, cal: &WorkCalendar) -> Task {
        let mut task = Task::new(id, start).with_duration(duration).with_owner(owner);
        task.reschedule(start, cal).unwrap();
        task
    }

    #[test]
    fn test_workload_basic() {
        let cal = WorkCalendar::new();
        let mut g = TaskGraph::new();
        // Mon Jan 1 .. Wed Jan 3 and Tue Jan 2 .. Thu Jan 4
        g.add_task(owned("A", d(2024, 1, 1), 3, "ana", &cal)).unwrap();
        g.add_task(owned("B", d(2024, 1, 2), 3, "ana", &cal)).unwrap();
        g.add_task(owned("C", d(2024, 1, 1), 2, "bo", &cal)).unwrap();
        g.add_task(Task::new("D", d(2024, 1, 1)).with_duration(4)).unwrap();

        let report = WorkloadReport::calculate(&g, &cal);
        let ana = report.owner("ana").unwrap();
        assert_eq!(ana.total_work_days, 6);
        assert_eq!(ana.task_count, 2);
        assert_eq!(ana.daily_load.len(), 4);
        assert_eq!(ana.daily_load[&d(2024, 1, 2)], 2);
        assert_eq!(ana.peak(), Some((d(2024, 1, 2), 2)));
        assert!((ana.average_daily_load() - 1.5).abs() < 1e-10);

        assert_eq!(report.owner("bo").unwrap().task_count, 1);
        assert_eq!(report.unassigned_work_days, 4);
        assert_eq!(
            report.overloaded(1),
            vec![("ana", d(2024, 1, 2), 2), ("ana", d(2024, 1, 3), 2)]
        );
    }

    #[test]
    fn test_weekends_carry_no_load() {
        let cal = WorkCalendar::new();
        let mut g = TaskGraph::new();
        // Thu Jan 4 + 3 work days spans the weekend.
        g.add_task(owned("A", d(2024, 1, 4), 3, "ana", &cal)).unwrap();

        let report = WorkloadReport::calculate(&g, &cal);
        let days: Vec<NaiveDate> = report.owner("ana").unwrap().daily_load.keys().copied().collect();
        assert_eq!(days, vec![d(2024, 1, 4), d(2024, 1, 5), d(2024, 1, 8)]);
    }

    #[test]
    fn test_weekend_start_counts_every_work_day() {
        let cal = WorkCalendar::new();
        let mut g = TaskGraph::new();
        // Sat Jan 6 moves to Mon Jan 8.
        g.add_task(owned("A", d(2024, 1, 6), 2, "ana", &cal)).unwrap();

        let report = WorkloadReport::calculate(&g, &cal);
        let ana = report.owner("ana").unwrap();
        assert_eq!(ana.total_work_days, 2);
        assert_eq!(ana.daily_load.len() as i64, ana.total_work_days);
        assert_eq!(
            ana.daily_load.keys().copied().collect::<Vec<_>>(),
            vec![d(2024, 1, 8), d(2024, 1, 9)]
        );
    }

    #[test]
    fn test_summary_tasks_not_counted() {
        let cal = WorkCalendar::new();
        let mut g = TaskGraph::new();
        g.add_task(owned("P", d(2024, 1, 1), 10, "lead", &cal)).unwrap();
        g.add_task(owned("A", d(2024, 1, 1), 1, "ana", &cal).with_parent("P"))
            .unwrap();

        let report = WorkloadReport::calculate(&g, &cal);
        assert!(report.owner("lead").is_none());
        assert_eq!(report.owner("ana").unwrap().total_work_days, 1);
    }

    #[test]
    fn test_milestone_has_no_load() {
        let cal = WorkCalendar::new();
        let mut g = TaskGraph::new();
        g.add_task(owned("M", d(2024, 1, 3), 0, "ana", &cal)).unwrap();

        let load = WorkloadReport::calculate(&g, &cal);
        let ana = load.owner("ana").unwrap();
        assert_eq!(ana.task_count, 1);
        assert!(ana.daily_load.is_empty());
        assert_eq!(ana.peak(), None);
        assert_eq!(ana.average_daily_load(), 0.0);
    }
}
