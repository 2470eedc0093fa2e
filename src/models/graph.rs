//! Task graph: tasks, precedence links and the WBS hierarchy.
//!
//! Tasks are nodes and links are edges of a petgraph `StableDiGraph`, so
//! removing a task never invalidates the indices of the others. Two hash
//! maps give O(1) lookup from task/link IDs to graph indices.
//!
//! The parent/child hierarchy is a separate tree relation kept alongside the
//! graph. Links may only touch leaf tasks, so the dependency graph is always
//! the leaf-task subgraph.
//!
//! This type performs structural checks only (unique IDs, endpoints exist,
//! no self-loops, hierarchy stays a tree). Acyclicity of the dependency
//! graph is checked by the scheduler against the would-be graph before a
//! link is committed.

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use super::{Link, Task};
use crate::error::{Error, Result};

/// In-memory store of tasks and links.
#[derive(Clone, Default)]
pub struct TaskGraph {
    graph: StableDiGraph<Task, Link>,
    task_index: HashMap<String, NodeIndex>,
    link_index: HashMap<String, EdgeIndex>,
    children: HashMap<String, Vec<String>>,
}

impl TaskGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Tasks ==========

    /// Adds a task.
    ///
    /// # Errors
    /// - `InvalidTaskState`: duplicate ID, negative duration, bad progress.
    /// - `InvalidHierarchy`: unknown parent, or the parent has links.
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        if self.task_index.contains_key(&task.id) {
            return Err(Error::InvalidTaskState(format!(
                "duplicate task ID: {}",
                task.id
            )));
        }
        task.check_state()?;
        if let Some(parent) = &task.parent {
            self.check_parent_eligible(&task.id, parent)?;
        }

        let id = task.id.clone();
        if let Some(parent) = &task.parent {
            self.children
                .entry(parent.clone())
                .or_default()
                .push(id.clone());
        }
        let index = self.graph.add_node(task);
        self.task_index.insert(id, index);
        Ok(())
    }

    /// Removes a task, its whole subtree, and every link touching them.
    ///
    /// Returns the removed tasks, the requested task first.
    pub fn remove_task(&mut self, id: &str) -> Result<Vec<Task>> {
        if !self.task_index.contains_key(id) {
            return Err(unknown_task(id));
        }

        let mut subtree = vec![id.to_string()];
        subtree.extend(self.descendant_ids(id));

        if let Some(parent) = self.task(id).and_then(|t| t.parent.clone()) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|c| c != id);
                if siblings.is_empty() {
                    self.children.remove(&parent);
                }
            }
        }

        let mut removed = Vec::with_capacity(subtree.len());
        for task_id in subtree {
            self.children.remove(&task_id);
            let Some(index) = self.task_index.remove(&task_id) else {
                continue;
            };
            let edges: Vec<EdgeIndex> = self
                .graph
                .edges_directed(index, Direction::Incoming)
                .chain(self.graph.edges_directed(index, Direction::Outgoing))
                .map(|e| e.id())
                .collect();
            for edge in edges {
                if let Some(link) = self.graph.remove_edge(edge) {
                    self.link_index.remove(&link.id);
                }
            }
            if let Some(task) = self.graph.remove_node(index) {
                removed.push(task);
            }
        }
        Ok(removed)
    }

    /// Moves a task under a new parent (or to the top level with `None`).
    ///
    /// # Errors
    /// `InvalidHierarchy` if the new parent is unknown, is the task itself or
    /// one of its descendants, or has dependency links.
    pub fn set_parent(&mut self, id: &str, parent: Option<&str>) -> Result<()> {
        let old_parent = self
            .task(id)
            .ok_or_else(|| unknown_task(id))?
            .parent
            .clone();

        if let Some(new_parent) = parent {
            if new_parent == id || self.descendant_ids(id).iter().any(|d| d == new_parent) {
                return Err(Error::InvalidHierarchy(format!(
                    "moving '{id}' under '{new_parent}' would make the hierarchy cyclic"
                )));
            }
            self.check_parent_eligible(id, new_parent)?;
        }

        if let Some(old) = &old_parent {
            if let Some(siblings) = self.children.get_mut(old) {
                siblings.retain(|c| c != id);
                if siblings.is_empty() {
                    self.children.remove(old);
                }
            }
        }
        if let Some(new_parent) = parent {
            self.children
                .entry(new_parent.to_string())
                .or_default()
                .push(id.to_string());
        }
        if let Some(task) = self.task_mut(id) {
            task.parent = parent.map(str::to_string);
        }
        Ok(())
    }

    fn check_parent_eligible(&self, child: &str, parent: &str) -> Result<()> {
        let index = self.task_index.get(parent).ok_or_else(|| {
            Error::InvalidHierarchy(format!(
                "task '{child}' references unknown parent '{parent}'"
            ))
        })?;
        if self.graph.edges_directed(*index, Direction::Incoming).next().is_some()
            || self.graph.edges_directed(*index, Direction::Outgoing).next().is_some()
        {
            return Err(Error::InvalidHierarchy(format!(
                "task '{parent}' has dependency links and cannot become a summary task"
            )));
        }
        Ok(())
    }

    /// Gets a task by ID.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.task_index
            .get(id)
            .and_then(|&index| self.graph.node_weight(index))
    }

    /// Gets a mutable task by ID.
    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        let index = *self.task_index.get(id)?;
        self.graph.node_weight_mut(index)
    }

    /// Whether the graph contains a task.
    pub fn contains_task(&self, id: &str) -> bool {
        self.task_index.contains_key(id)
    }

    /// All tasks, in no particular order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.graph.node_weights()
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    // ========== Links ==========

    /// Adds a link.
    ///
    /// Does not check acyclicity; see [`TaskGraph::would_create_cycle`].
    ///
    /// # Errors
    /// `InvalidLink` for a duplicate link ID, a self-loop, a missing
    /// endpoint, an endpoint that is a summary task, or a second link
    /// between the same pair of tasks.
    pub fn add_link(&mut self, link: Link) -> Result<()> {
        let (source, target) = self.check_link(&link)?;
        let id = link.id.clone();
        let edge = self.graph.add_edge(source, target, link);
        self.link_index.insert(id, edge);
        Ok(())
    }

    /// Validates a link against the current graph without adding it.
    pub(crate) fn check_link(&self, link: &Link) -> Result<(NodeIndex, NodeIndex)> {
        if self.link_index.contains_key(&link.id) {
            return Err(Error::InvalidLink(format!("duplicate link ID: {}", link.id)));
        }
        if link.is_self_loop() {
            return Err(Error::InvalidLink(format!(
                "link '{}' is a self-loop on '{}'",
                link.id, link.source
            )));
        }
        let source = self.endpoint(&link.id, &link.source)?;
        let target = self.endpoint(&link.id, &link.target)?;
        if self.graph.find_edge(source, target).is_some() {
            return Err(Error::InvalidLink(format!(
                "a link from '{}' to '{}' already exists",
                link.source, link.target
            )));
        }
        Ok((source, target))
    }

    fn endpoint(&self, link_id: &str, task_id: &str) -> Result<NodeIndex> {
        let index = self.task_index.get(task_id).ok_or_else(|| {
            Error::InvalidLink(format!(
                "link '{link_id}' references unknown task '{task_id}'"
            ))
        })?;
        if !self.is_leaf(task_id) {
            return Err(Error::InvalidLink(format!(
                "link '{link_id}' references summary task '{task_id}'"
            )));
        }
        Ok(*index)
    }

    /// Removes a link.
    pub fn remove_link(&mut self, id: &str) -> Result<Link> {
        let edge = self
            .link_index
            .remove(id)
            .ok_or_else(|| Error::InvalidLink(format!("unknown link ID: {id}")))?;
        self.graph
            .remove_edge(edge)
            .ok_or_else(|| Error::InvalidLink(format!("unknown link ID: {id}")))
    }

    /// Gets a link by ID.
    pub fn link(&self, id: &str) -> Option<&Link> {
        self.link_index
            .get(id)
            .and_then(|&edge| self.graph.edge_weight(edge))
    }

    /// Gets a mutable link by ID.
    ///
    /// Only the link type and lag should be changed through this reference;
    /// endpoints are fixed by the graph structure.
    pub(crate) fn link_mut(&mut self, id: &str) -> Option<&mut Link> {
        let edge = *self.link_index.get(id)?;
        self.graph.edge_weight_mut(edge)
    }

    /// Whether the graph contains a link.
    pub fn contains_link(&self, id: &str) -> bool {
        self.link_index.contains_key(id)
    }

    /// All links, in no particular order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.graph.edge_weights()
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether adding `source → target` would close a dependency cycle.
    ///
    /// True iff `target` already reaches `source` (or they are equal).
    /// Unknown IDs never form a cycle.
    pub fn would_create_cycle(&self, source: &str, target: &str) -> bool {
        match (self.task_index.get(source), self.task_index.get(target)) {
            (Some(&s), Some(&t)) => has_path_connecting(&self.graph, t, s, None),
            _ => false,
        }
    }

    // ========== Queries ==========

    /// Links whose target is `id`.
    pub fn incoming_links(&self, id: &str) -> Vec<&Link> {
        self.links_directed(id, Direction::Incoming)
    }

    /// Links whose source is `id`.
    pub fn outgoing_links(&self, id: &str) -> Vec<&Link> {
        self.links_directed(id, Direction::Outgoing)
    }

    fn links_directed(&self, id: &str, direction: Direction) -> Vec<&Link> {
        match self.task_index.get(id) {
            Some(&index) => self
                .graph
                .edges_directed(index, direction)
                .map(|e| e.weight())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Tasks `id` depends on.
    pub fn predecessors_of(&self, id: &str) -> Vec<&Task> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Tasks that depend on `id`.
    pub fn successors_of(&self, id: &str) -> Vec<&Task> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&Task> {
        match self.task_index.get(id) {
            Some(&index) => self
                .graph
                .neighbors_directed(index, direction)
                .filter_map(|n| self.graph.node_weight(n))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Direct children of a summary task, in insertion order.
    pub fn children_of(&self, id: &str) -> Vec<&Task> {
        self.child_ids(id)
            .iter()
            .filter_map(|c| self.task(c))
            .collect()
    }

    /// IDs of the direct children of `id`.
    pub fn child_ids(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent (summary) task of `id`.
    pub fn parent_of(&self, id: &str) -> Option<&Task> {
        self.task(id)?.parent.as_deref().and_then(|p| self.task(p))
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors_of(&self, id: &str) -> Vec<&Task> {
        let mut ancestors = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(task) = current {
            ancestors.push(task);
            current = self.parent_of(&task.id);
        }
        ancestors
    }

    /// IDs of every task below `id` in the hierarchy (pre-order).
    pub fn descendant_ids(&self, id: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut stack: Vec<&String> = self.child_ids(id).iter().rev().collect();
        while let Some(current) = stack.pop() {
            result.push(current.clone());
            stack.extend(self.child_ids(current).iter().rev());
        }
        result
    }

    /// Number of ancestors of `id` (0 for top-level tasks).
    pub fn depth(&self, id: &str) -> usize {
        self.ancestors_of(id).len()
    }

    /// Whether `id` has no children.
    pub fn is_leaf(&self, id: &str) -> bool {
        self.children.get(id).map_or(true, Vec::is_empty)
    }

    /// All tasks without children.
    pub fn leaf_tasks(&self) -> Vec<&Task> {
        self.graph
            .node_weights()
            .filter(|t| self.is_leaf(&t.id))
            .collect()
    }

    /// Leaf task IDs in topological order of the dependency links.
    ///
    /// # Errors
    /// `CycleDetected` if the links contain a cycle; this cannot happen for
    /// a graph only mutated through the scheduler.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            let id = self
                .graph
                .node_weight(cycle.node_id())
                .map(|t| t.id.clone())
                .unwrap_or_default();
            Error::CycleDetected {
                from: id.clone(),
                to: id,
            }
        })?;

        Ok(sorted
            .into_iter()
            .filter_map(|index| self.graph.node_weight(index))
            .filter(|t| self.is_leaf(&t.id))
            .map(|t| t.id.clone())
            .collect())
    }
}

fn unknown_task(id: &str) -> Error {
    Error::InvalidTaskState(format!("unknown task ID: {id}"))
}

impl std::fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.task_count())
            .field("links", &self.link_count())
            .finish()
    }
}
