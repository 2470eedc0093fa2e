//! Critical Path Method (CPM).
//!
//! Computes earliest/latest start and finish and total float for every
//! leaf task, and the set of critical tasks. Summary tasks are rollups and
//! take no part in the analysis.
//!
//! # Time Model
//! All values are integer working-day offsets from project time 0.
//!
//! # Algorithm
//!
//! Forward pass (topological order):
//! `ES(t) = max(0, max over links p→t of bound)`, `EF = ES + d`, where the
//! bound anchors on `EF(p)` (FS, FF) or `ES(p)` (SS, SF), adds `lag`, and
//! subtracts `d(t)` when the link constrains the target's finish (FF, SF).
//!
//! Backward pass (reverse topological order), the exact mirror:
//! `LF(t) = min(projectEnd, min over links t→s of limit)`, `LS = LF - d`,
//! where the limit anchors on `LS(s)` (FS, SS) or `LF(s)` (FF, SF),
//! subtracts `lag`, and adds `d(t)` when the link starts from the source's
//! start (SS, SF).
//!
//! `float = LS - ES`; a task is critical iff `|float| <= tolerance`.
//!
//! Both passes use an explicit queue (Kahn's algorithm); stack depth does
//! not grow with the graph.
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-Path Planning and Scheduling"

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::models::TaskGraph;

/// Caller-owned analysis settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalPathOptions {
    /// Largest absolute float still considered critical (work days).
    #[serde(default)]
    pub float_tolerance: i64,
}

impl CriticalPathOptions {
    /// Sets the float tolerance.
    pub fn with_float_tolerance(mut self, tolerance: i64) -> Self {
        self.float_tolerance = tolerance;
        self
    }
}

/// CPM values of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetrics {
    /// Earliest start.
    pub es: i64,
    /// Earliest finish.
    pub ef: i64,
    /// Latest start.
    pub ls: i64,
    /// Latest finish.
    pub lf: i64,
    /// Total float (`ls - es`).
    pub float: i64,
}

/// Result of a critical path analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalPathReport {
    /// IDs of tasks with zero float (within tolerance).
    pub critical_task_ids: BTreeSet<String>,
    /// Per-task CPM values.
    pub metrics: BTreeMap<String, TaskMetrics>,
    /// Latest earliest finish over all tasks (0 for an empty plan).
    pub project_end: i64,
}

impl CriticalPathReport {
    /// Whether a task is critical.
    pub fn is_critical(&self, id: &str) -> bool {
        self.critical_task_ids.contains(id)
    }

    /// CPM values of one task.
    pub fn metrics_for(&self, id: &str) -> Option<&TaskMetrics> {
        self.metrics.get(id)
    }

    /// Critical tasks ordered by earliest start, ties by ID.
    pub fn critical_chain(&self) -> Vec<&str> {
        let mut chain: Vec<(i64, &str)> = self
            .critical_task_ids
            .iter()
            .filter_map(|id| self.metrics.get(id).map(|m| (m.es, id.as_str())))
            .collect();
        chain.sort();
        chain.into_iter().map(|(_, id)| id).collect()
    }
}

/// Forward/backward pass analyzer.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use u_plan::analysis::{CriticalPathAnalyzer, CriticalPathOptions};
/// use u_plan::models::{Link, Task, TaskGraph};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let mut graph = TaskGraph::new();
/// graph.add_task(Task::new("A", start).with_duration(4)).unwrap();
/// graph.add_task(Task::new("B", start).with_duration(5)).unwrap();
/// graph.add_link(Link::new("L1", "A", "B")).unwrap();
///
/// let report = CriticalPathAnalyzer::new(CriticalPathOptions::default()).analyze(&graph);
/// assert_eq!(report.project_end, 9);
/// assert!(report.is_critical("A") && report.is_critical("B"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CriticalPathAnalyzer {
    options: CriticalPathOptions,
}

impl CriticalPathAnalyzer {
    pub fn new(options: CriticalPathOptions) -> Self {
        Self { options }
    }

    /// Runs both passes over the leaf tasks of `graph`.
    pub fn analyze(&self, graph: &TaskGraph) -> CriticalPathReport {
        let order = leaf_order(graph);
        if order.is_empty() {
            return CriticalPathReport::default();
        }

        let mut metrics: HashMap<&str, TaskMetrics> = HashMap::with_capacity(order.len());
        let duration = |id: &str| graph.task(id).map_or(0, |t| t.duration);

        // Forward pass
        for &id in &order {
            let d = duration(id);
            let mut es = 0;
            for link in graph.incoming_links(id) {
                let Some(p) = metrics.get(link.source.as_str()) else {
                    continue;
                };
                let anchor = if link.link_type.from_source_finish() {
                    p.ef
                } else {
                    p.es
                };
                let mut bound = anchor + link.lag;
                if link.link_type.to_target_finish() {
                    bound -= d;
                }
                es = es.max(bound);
            }
            metrics.insert(
                id,
                TaskMetrics {
                    es,
                    ef: es + d,
                    ls: 0,
                    lf: 0,
                    float: 0,
                },
            );
        }

        let project_end = metrics.values().map(|m| m.ef).max().unwrap_or(0);

        // Backward pass
        for &id in order.iter().rev() {
            let d = duration(id);
            let mut lf = project_end;
            for link in graph.outgoing_links(id) {
                let Some(s) = metrics.get(link.target.as_str()) else {
                    continue;
                };
                let anchor = if link.link_type.to_target_finish() {
                    s.lf
                } else {
                    s.ls
                };
                let mut limit = anchor - link.lag;
                if !link.link_type.from_source_finish() {
                    limit += d;
                }
                lf = lf.min(limit);
            }
            if let Some(m) = metrics.get_mut(id) {
                m.lf = lf;
                m.ls = lf - d;
                m.float = m.ls - m.es;
            }
        }

        let tolerance = self.options.float_tolerance;
        let critical_task_ids: BTreeSet<String> = metrics
            .iter()
            .filter(|(_, m)| m.float.abs() <= tolerance)
            .map(|(id, _)| id.to_string())
            .collect();

        tracing::debug!(
            tasks = metrics.len(),
            critical = critical_task_ids.len(),
            project_end,
            "critical path computed"
        );

        CriticalPathReport {
            critical_task_ids,
            metrics: metrics
                .into_iter()
                .map(|(id, m)| (id.to_string(), m))
                .collect(),
            project_end,
        }
    }
}

/// Leaf task IDs in topological order (Kahn's algorithm, ties by ID).
fn leaf_order(graph: &TaskGraph) -> Vec<&str> {
    let mut leaves: Vec<&str> = graph.leaf_tasks().iter().map(|t| t.id.as_str()).collect();
    leaves.sort_unstable();

    let mut in_degree: HashMap<&str, usize> = leaves
        .iter()
        .map(|&id| (id, graph.incoming_links(id).len()))
        .collect();

    let mut queue: VecDeque<&str> = leaves
        .iter()
        .copied()
        .filter(|id| in_degree.get(id) == Some(&0))
        .collect();

    let mut order = Vec::with_capacity(leaves.len());
    while let Some(id) = queue.pop_front() {
        order.push(id);
        let mut successors: Vec<&str> = graph
            .outgoing_links(id)
            .into_iter()
            .map(|l| l.target.as_str())
            .collect();
        successors.sort_unstable();
        for succ in successors {
            if let Some(deg) = in_degree.get_mut(succ) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(succ);
                }
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Link, LinkType, Task};
    use chrono::NaiveDate;

    fn graph_with(tasks: &[(&str, i64)], links: &[(&str, &str, LinkType, i64)]) -> TaskGraph {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut g = TaskGraph::new();
        for &(id, duration) in tasks {
            g.add_task(Task::new(id, start).with_duration(duration)).unwrap();
        }
        for (i, &(s, t, kind, lag)) in links.iter().enumerate() {
            g.add_link(Link::new(format!("L{i}"), s, t).with_type(kind).with_lag(lag))
                .unwrap();
        }
        g
    }

    fn analyze(g: &TaskGraph) -> CriticalPathReport {
        CriticalPathAnalyzer::default().analyze(g)
    }

    const FS: LinkType = LinkType::FinishToStart;

    #[test]
    fn test_two_task_chain() {
        let g = graph_with(&[("A", 4), ("B", 5)], &[("A", "B", FS, 0)]);
        let r = analyze(&g);

        let a = r.metrics_for("A").unwrap();
        let b = r.metrics_for("B").unwrap();
        assert_eq!((a.es, a.ef), (0, 4));
        assert_eq!((b.es, b.ef), (4, 9));
        assert_eq!(r.project_end, 9);
        assert_eq!(a.float, 0);
        assert_eq!(b.float, 0);
        assert!(r.is_critical("A"));
        assert!(r.is_critical("B"));
    }

    #[test]
    fn test_parallel_branch_has_float() {
        let g = graph_with(
            &[("A", 4), ("B", 5), ("C", 2)],
            &[("A", "B", FS, 0), ("A", "C", FS, 0)],
        );
        let r = analyze(&g);

        let c = r.metrics_for("C").unwrap();
        assert_eq!((c.es, c.ef, c.ls, c.lf), (4, 6, 7, 9));
        assert_eq!(c.float, 3);
        assert!(!r.is_critical("C"));
        assert_eq!(r.critical_chain(), vec!["A", "B"]);
    }

    #[test]
    fn test_empty_graph() {
        let r = analyze(&TaskGraph::new());
        assert!(r.critical_task_ids.is_empty());
        assert!(r.metrics.is_empty());
        assert_eq!(r.project_end, 0);
    }

    #[test]
    fn test_lag_and_lead() {
        let g = graph_with(
            &[("A", 3), ("B", 2), ("C", 4)],
            &[("A", "B", FS, 2), ("B", "C", FS, -1)],
        );
        let r = analyze(&g);
        assert_eq!(r.metrics_for("B").unwrap().es, 5);
        assert_eq!(r.metrics_for("C").unwrap().es, 6);
        assert_eq!(r.project_end, 10);
        assert_eq!(r.critical_task_ids.len(), 3);
    }

    #[test]
    fn test_start_to_start_backward_pass() {
        // Long driver with a short SS follower: the driver finishes last and
        // is critical; the follower has float.
        let g = graph_with(
            &[("A", 10), ("B", 1)],
            &[("A", "B", LinkType::StartToStart, 0)],
        );
        let r = analyze(&g);
        let a = r.metrics_for("A").unwrap();
        let b = r.metrics_for("B").unwrap();
        assert_eq!((a.es, a.ef, a.ls, a.lf), (0, 10, 0, 10));
        assert_eq!((b.es, b.ef, b.ls, b.lf), (0, 1, 9, 10));
        assert!(r.is_critical("A"));
        assert_eq!(b.float, 9);
    }

    #[test]
    fn test_start_to_start_with_lag_symmetric() {
        let g = graph_with(
            &[("A", 4), ("B", 5)],
            &[("A", "B", LinkType::StartToStart, 2)],
        );
        let r = analyze(&g);
        let a = r.metrics_for("A").unwrap();
        let b = r.metrics_for("B").unwrap();
        assert_eq!((b.es, b.ef), (2, 7));
        assert_eq!(r.project_end, 7);
        // B's latest start (2) minus lag pins A's latest start at 0.
        assert_eq!((a.ls, a.lf), (0, 4));
        assert_eq!(a.float, 0);
        assert_eq!(b.float, 0);
    }

    #[test]
    fn test_finish_to_finish() {
        let g = graph_with(
            &[("A", 6), ("B", 2)],
            &[("A", "B", LinkType::FinishToFinish, 1)],
        );
        let r = analyze(&g);
        let b = r.metrics_for("B").unwrap();
        assert_eq!((b.es, b.ef), (5, 7));
        let a = r.metrics_for("A").unwrap();
        assert_eq!((a.ls, a.lf), (0, 6));
        assert!(r.is_critical("A") && r.is_critical("B"));
    }

    #[test]
    fn test_start_to_finish() {
        let g = graph_with(
            &[("A", 3), ("B", 2), ("X", 5)],
            &[("X", "A", FS, 0), ("A", "B", LinkType::StartToFinish, 0)],
        );
        let r = analyze(&g);
        // B must finish no earlier than A starts (5): ES(B) = 3.
        let b = r.metrics_for("B").unwrap();
        assert_eq!((b.es, b.ef), (3, 5));
        assert_eq!(r.project_end, 8);
        assert_eq!(b.float, 3);
    }

    #[test]
    fn test_lead_cannot_start_before_zero() {
        let g = graph_with(&[("A", 2), ("B", 3)], &[("A", "B", FS, -5)]);
        let r = analyze(&g);
        assert_eq!(r.metrics_for("B").unwrap().es, 0);
    }

    #[test]
    fn test_summary_tasks_excluded() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut g = TaskGraph::new();
        g.add_task(Task::new("P", start).with_duration(50)).unwrap();
        g.add_task(Task::new("A", start).with_duration(3).with_parent("P"))
            .unwrap();
        let r = analyze(&g);
        assert!(r.metrics_for("P").is_none());
        assert_eq!(r.project_end, 3);
    }

    #[test]
    fn test_float_tolerance() {
        let g = graph_with(
            &[("A", 4), ("B", 5), ("C", 4)],
            &[("A", "B", FS, 0), ("A", "C", FS, 0)],
        );
        let strict = analyze(&g);
        assert!(!strict.is_critical("C"));

        let loose = CriticalPathAnalyzer::new(CriticalPathOptions::default().with_float_tolerance(1))
            .analyze(&g);
        assert!(loose.is_critical("C"));
    }

    #[test]
    fn test_report_serializes() {
        let g = graph_with(&[("A", 4)], &[]);
        let json = serde_json::to_value(analyze(&g)).unwrap();
        assert_eq!(json["project_end"], 4);
        assert_eq!(json["metrics"]["A"]["ef"], 4);
        assert_eq!(json["critical_task_ids"][0], "A");
    }
}
