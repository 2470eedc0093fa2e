//! Input validation for bulk-loaded projects.
//!
//! Checks structural integrity of tasks and links before they are loaded
//! into a [`TaskGraph`](crate::models::TaskGraph). Single edits are
//! validated by the scheduler; this module covers the import path, where
//! every problem should be reported at once. Detects:
//! - Duplicate task and link IDs
//! - Out-of-range duration or progress
//! - Unknown or cyclic parent references
//! - Invalid links (unknown endpoint, self-loop, duplicate pair)
//! - Links touching summary tasks
//! - Circular dependencies (DAG validation)
//! - Calendars without working days
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::models::{Link, Task, WorkCalendar};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two tasks or two links share the same ID.
    DuplicateId,
    /// A task has a negative duration or progress outside `[0, 1]`.
    InvalidTaskState,
    /// A task references a parent that doesn't exist.
    UnknownParent,
    /// Parent references form a loop.
    HierarchyCycle,
    /// A link has an unknown endpoint, is a self-loop, or repeats a pair.
    InvalidLink,
    /// A link touches a task that has children.
    LinkOnSummary,
    /// Dependency links contain a cycle.
    CyclicDependency,
    /// The calendar has no working day.
    InvalidCalendar,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates a project before it is loaded.
///
/// Checks:
/// 1. The calendar has at least one working day
/// 2. No duplicate task IDs
/// 3. Every task has a valid duration and progress
/// 4. Every parent reference points to an existing task
/// 5. Parent references are acyclic
/// 6. No duplicate link IDs
/// 7. Every link joins two distinct, existing leaf tasks, at most once
/// 8. No circular dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_project(tasks: &[Task], links: &[Link], calendar: &WorkCalendar) -> ValidationResult {
    let mut errors = Vec::new();

    if calendar.working_days_per_week() == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidCalendar,
            "Calendar has no working day",
        ));
    }

    // Tasks
    let mut parents: HashMap<&str, Option<&str>> = HashMap::new();
    for task in tasks {
        if parents
            .insert(task.id.as_str(), task.parent.as_deref())
            .is_some()
        {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", task.id),
            ));
        }
        if let Err(e) = task.check_state() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTaskState,
                e.to_string(),
            ));
        }
    }

    for task in tasks {
        if let Some(parent) = task.parent.as_deref() {
            if !parents.contains_key(parent) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownParent,
                    format!("Task '{}' references unknown parent '{parent}'", task.id),
                ));
            }
        }
    }

    errors.extend(detect_hierarchy_cycles(&parents));

    let summaries: HashSet<&str> = tasks.iter().filter_map(|t| t.parent.as_deref()).collect();

    // Links
    let mut link_ids = HashSet::new();
    let mut pairs = HashSet::new();
    let mut valid_links = Vec::with_capacity(links.len());
    for link in links {
        if !link_ids.insert(link.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate link ID: {}", link.id),
            ));
            continue;
        }

        let mut ok = true;
        for endpoint in [&link.source, &link.target] {
            if !parents.contains_key(endpoint.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidLink,
                    format!("Link '{}' references unknown task '{endpoint}'", link.id),
                ));
                ok = false;
            } else if summaries.contains(endpoint.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::LinkOnSummary,
                    format!("Link '{}' touches summary task '{endpoint}'", link.id),
                ));
                ok = false;
            }
        }
        if link.is_self_loop() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidLink,
                format!("Link '{}' connects '{}' to itself", link.id, link.source),
            ));
            ok = false;
        } else if !pairs.insert((link.source.as_str(), link.target.as_str())) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidLink,
                format!(
                    "Link '{}' duplicates an existing link '{}' -> '{}'",
                    link.id, link.source, link.target
                ),
            ));
            ok = false;
        }
        if ok {
            valid_links.push(link);
        }
    }

    if let Some(cycle_err) = detect_cycles(&valid_links) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Follows each parent chain; a chain that revisits a task is a loop.
///
/// Each loop is reported once, by its smallest member ID.
fn detect_hierarchy_cycles<'a>(parents: &HashMap<&'a str, Option<&'a str>>) -> Vec<ValidationError> {
    let mut settled: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<&str> = HashSet::new();
    let mut errors = Vec::new();

    let mut ids: Vec<&str> = parents.keys().copied().collect();
    ids.sort_unstable();

    for &start in &ids {
        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut current = Some(start);

        while let Some(id) = current {
            if settled.contains(id) {
                break;
            }
            if !on_path.insert(id) {
                let pos = path.iter().position(|&p| p == id).unwrap_or(0);
                let mut members = path[pos..].to_vec();
                members.sort_unstable();
                if reported.insert(members[0]) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::HierarchyCycle,
                        format!("Parent references form a loop: {}", members.join(", ")),
                    ));
                }
                break;
            }
            path.push(id);
            current = parents.get(id).copied().flatten();
        }
        settled.extend(path);
    }
    errors
}

/// Detects cycles in the dependency graph with Kahn's algorithm.
///
/// # Algorithm
/// Repeatedly removes tasks with no remaining predecessors. Whatever is
/// left once no such task exists lies on or behind a cycle.
///
/// # Reference
/// Kahn (1962), "Topological sorting of large networks"
fn detect_cycles(links: &[&Link]) -> Option<ValidationError> {
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();

    for link in links {
        adj.entry(link.source.as_str())
            .or_default()
            .push(link.target.as_str());
        in_degree.entry(link.source.as_str()).or_insert(0);
        *in_degree.entry(link.target.as_str()).or_insert(0) += 1;
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    while let Some(node) = queue.pop_front() {
        for &next in adj.get(node).into_iter().flatten() {
            if let Some(deg) = in_degree.get_mut(next) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    let mut remaining: Vec<&str> = in_degree
        .into_iter()
        .filter(|(_, deg)| *deg > 0)
        .map(|(id, _)| id)
        .collect();
    if remaining.is_empty() {
        return None;
    }
    remaining.sort_unstable();
    Some(ValidationError::new(
        ValidationErrorKind::CyclicDependency,
        format!(
            "Circular dependency detected involving tasks: {}",
            remaining.join(", ")
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn sample_tasks() -> Vec<Task> {
        vec![
            Task::new("P", start()).with_name("Phase 1"),
            Task::new("A", start()).with_duration(2).with_parent("P"),
            Task::new("B", start()).with_duration(3).with_parent("P"),
            Task::new("C", start()).with_duration(1),
        ]
    }

    fn sample_links() -> Vec<Link> {
        vec![Link::new("L1", "A", "B"), Link::new("L2", "B", "C")]
    }

    fn kinds(errors: &[ValidationError]) -> Vec<ValidationErrorKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_input() {
        let cal = WorkCalendar::new();
        assert!(validate_project(&sample_tasks(), &sample_links(), &cal).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let mut tasks = sample_tasks();
        tasks.push(Task::new("C", start()));
        let mut links = sample_links();
        links.push(Link::new("L1", "A", "C"));

        let errors = validate_project(&tasks, &links, &WorkCalendar::new()).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![ValidationErrorKind::DuplicateId, ValidationErrorKind::DuplicateId]
        );
        assert!(errors[1].message.contains("link"));
    }

    #[test]
    fn test_invalid_task_state() {
        let mut tasks = sample_tasks();
        tasks.push(Task::new("X", start()).with_duration(-1));
        tasks.push(Task::new("Y", start()).with_progress(1.5));

        let errors = validate_project(&tasks, &[], &WorkCalendar::new()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::InvalidTaskState));
    }

    #[test]
    fn test_unknown_parent() {
        let tasks = vec![Task::new("A", start()).with_parent("GHOST")];
        let errors = validate_project(&tasks, &[], &WorkCalendar::new()).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::UnknownParent]);
    }

    #[test]
    fn test_hierarchy_cycle() {
        let tasks = vec![
            Task::new("A", start()).with_parent("B"),
            Task::new("B", start()).with_parent("A"),
            Task::new("C", start()).with_parent("A"),
        ];
        let errors = validate_project(&tasks, &[], &WorkCalendar::new()).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::HierarchyCycle]);
        assert!(errors[0].message.contains("A, B"));
    }

    #[test]
    fn test_invalid_links() {
        let links = vec![
            Link::new("L1", "A", "GHOST"),
            Link::new("L2", "C", "C"),
            Link::new("L3", "A", "B"),
            Link::new("L4", "A", "B"),
        ];
        let errors = validate_project(&sample_tasks(), &links, &WorkCalendar::new()).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                ValidationErrorKind::InvalidLink,
                ValidationErrorKind::InvalidLink,
                ValidationErrorKind::InvalidLink,
            ]
        );
    }

    #[test]
    fn test_link_on_summary() {
        let links = vec![Link::new("L1", "P", "C")];
        let errors = validate_project(&sample_tasks(), &links, &WorkCalendar::new()).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::LinkOnSummary]);
    }

    #[test]
    fn test_cyclic_dependency() {
        let mut links = sample_links();
        links.push(Link::new("L3", "C", "A"));

        let errors = validate_project(&sample_tasks(), &links, &WorkCalendar::new()).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::CyclicDependency]);
        assert!(errors[0].message.contains("A, B, C"));
    }

    #[test]
    fn test_long_chain_no_stack_overflow() {
        let tasks: Vec<Task> = (0..50_000)
            .map(|i| Task::new(format!("T{i}"), start()))
            .collect();
        let links: Vec<Link> = (1..50_000)
            .map(|i| Link::new(format!("L{i}"), format!("T{}", i - 1), format!("T{i}")))
            .collect();
        assert!(validate_project(&tasks, &links, &WorkCalendar::new()).is_ok());
    }

    #[test]
    fn test_calendar_without_working_days() {
        let mut closed = WorkCalendar::new();
        for day in [
            chrono::Weekday::Mon,
            chrono::Weekday::Tue,
            chrono::Weekday::Wed,
            chrono::Weekday::Thu,
            chrono::Weekday::Fri,
        ] {
            closed = closed.with_day(day, false);
        }
        let errors = validate_project(&sample_tasks(), &[], &closed).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidCalendar]);
    }

    #[test]
    fn test_all_errors_reported_together() {
        let tasks = vec![
            Task::new("A", start()).with_duration(-2),
            Task::new("A", start()),
            Task::new("B", start()).with_parent("NOPE"),
        ];
        let links = vec![Link::new("L1", "A", "Z")];
        let errors = validate_project(&tasks, &links, &WorkCalendar::new()).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
